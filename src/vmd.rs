//! VMD scripts for rendering COVP isosurfaces.
//!
//! For each occupied/virtual orbital pair the load script adds the two cube
//! files to molecule 0, the render script points four isosurface
//! representations at them and renders with Tachyon, and a bash script turns
//! the TGA images into PNG.

use log::info;
use std::fs;
use std::io;
use std::path::Path;

/// Load script file name.
pub const LOAD_FILE: &str = "vmd.covp.load";
/// Render script file name.
pub const RENDER_FILE: &str = "vmd.covp.render";
/// Combined load + render script file name.
pub const COMBINED_FILE: &str = "vmd.covp.load_render";
/// TGA to PNG conversion script file name.
pub const BASH_FILE: &str = "vmd.covp.bash";

const BASE_TEMPLATE: &str = "\
# general display and rendering settings
display antialias on
display depthcue off
display culling off
display rendermode GLSL
display projection orthographic
display resize 1050 1050
axes location off
menu graphics on

# general color settings
color Element C gray
color Axes Labels black
color Display Background white

# create a new material
material add copy GlassBubble
material rename Material22   GlassBubble2
material change ambient      GlassBubble2 0.000000
material change diffuse      GlassBubble2 1.000000
material change specular     GlassBubble2 1.000000
material change shininess    GlassBubble2 1.000000
material change opacity      GlassBubble2 0.380000
material change outline      GlassBubble2 0.890000
material change outlinewidth GlassBubble2 0.000000
material change transmode    GlassBubble2 1.000000
";

/// VMD color IDs for the four isosurfaces: blue2, red3, cyan2, mauve.
const SURFACE_COLORS: [u32; 4] = [23, 30, 21, 13];

/// Left-pads a number with zeros to `width` digits. Wider numbers are
/// returned unchanged.
///
/// ```
/// use qctools::vmd::pad_left_zeros;
///
/// assert_eq!(pad_left_zeros(7, 3), "007");
/// assert_eq!(pad_left_zeros(1234, 3), "1234");
/// ```
pub fn pad_left_zeros(num: usize, width: usize) -> String {
    format!("{:0>width$}", num, width = width)
}

fn load_xyz(xyz: &str) -> String {
    let [c1, c2, c3, c4] = SURFACE_COLORS;
    format!(
        "# load the base XYZ file
mol new {{{xyz}}} type {{xyz}} first 0 last -1 step 1 waitfor 1
mol modcolor 0 0 Element
mol modmaterial 0 0 HardPlastic
mol modstyle 0 0 CPK 1.000000 0.300000 100.000000 100.000000

# add representations for 4 isosurfaces: 1 COVP, 2 phases (opposite sign)
mol addrep 0
mol addrep 0
mol addrep 0
mol addrep 0

mol modstyle 1 0 Isosurface  0.05 0 0 0 1 1
mol modstyle 2 0 Isosurface -0.05 0 0 0 1 1
mol modstyle 3 0 Isosurface  0.05 0 0 0 1 1
mol modstyle 4 0 Isosurface -0.05 0 0 0 1 1

mol modcolor 1 0 ColorID {c1}
mol modcolor 2 0 ColorID {c2}
mol modcolor 3 0 ColorID {c3}
mol modcolor 4 0 ColorID {c4}

mol modmaterial 1 0 GlassBubble2
mol modmaterial 2 0 GlassBubble2
mol modmaterial 3 0 GlassBubble2
mol modmaterial 4 0 GlassBubble2

"
    )
}

fn pair_load(a: &str, b: &str) -> String {
    format!("\nmol addfile mo.{a}.cube\nmol addfile mo.{b}.cube\n")
}

fn pair_render(a: &str, b: &str, vmd1: usize, vmd2: usize) -> String {
    format!(
        "
mol modstyle 1 0 Isosurface  0.05 {vmd1} 0 0 1 1
mol modstyle 2 0 Isosurface -0.05 {vmd1} 0 0 1 1
mol modstyle 3 0 Isosurface  0.05 {vmd2} 0 0 1 1
mol modstyle 4 0 Isosurface -0.05 {vmd2} 0 0 1 1
render TachyonInternal COVP_{a}_{b}.tga
"
    )
}

fn tga_convert(a: &str, b: &str) -> String {
    format!(
        "
echo \"convert COVP_{a}_{b}.tga COVP_{a}_{b}.png\"
convert COVP_{a}_{b}.tga COVP_{a}_{b}.png
echo \"rm -f COVP_{a}_{b}.tga\"
rm -f COVP_{a}_{b}.tga
"
    )
}

/// The three script texts for a list of orbital pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CovpScripts {
    /// Settings, molecule loading and cube file loading
    pub load: String,
    /// Isosurface switching and rendering, one block per pair
    pub render: String,
    /// TGA to PNG conversion
    pub bash: String,
}

impl CovpScripts {
    /// Builds the scripts.
    ///
    /// `width` is the digit count used in the cube file names, typically the
    /// number of digits in the total MO count. Pair `k` (0-based) uses the
    /// volumetric data sets `2k` and `2k + 1` of molecule 0.
    pub fn build(xyz: &str, pairs: &[(usize, usize)], width: usize) -> Self {
        let mut load = String::from(BASE_TEMPLATE);
        load.push_str(&load_xyz(xyz));
        let mut render = String::new();
        let mut bash = String::from("#!/bin/bash\n");

        for (k, &(occ, virt)) in pairs.iter().enumerate() {
            let a = pad_left_zeros(occ, width);
            let b = pad_left_zeros(virt, width);
            load.push_str(&pair_load(&a, &b));
            render.push_str(&pair_render(&a, &b, 2 * k, 2 * k + 1));
            bash.push_str(&tga_convert(&a, &b));
        }

        Self { load, render, bash }
    }

    /// Writes `vmd.covp.load`, `vmd.covp.render` and `vmd.covp.bash` into `dir`.
    pub fn write_separate(&self, dir: &Path) -> io::Result<()> {
        fs::write(dir.join(LOAD_FILE), &self.load)?;
        fs::write(dir.join(RENDER_FILE), &self.render)?;
        fs::write(dir.join(BASH_FILE), &self.bash)?;
        info!("Wrote {}, {} and {}", LOAD_FILE, RENDER_FILE, BASH_FILE);
        Ok(())
    }

    /// Writes `vmd.covp.load_render` and `vmd.covp.bash` into `dir`.
    pub fn write_combined(&self, dir: &Path) -> io::Result<()> {
        fs::write(dir.join(COMBINED_FILE), format!("{}{}", self.load, self.render))?;
        fs::write(dir.join(BASH_FILE), &self.bash)?;
        info!("Wrote {} and {}", COMBINED_FILE, BASH_FILE);
        Ok(())
    }
}
