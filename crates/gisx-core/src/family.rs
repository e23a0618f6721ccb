//! Module family (class) naming.
//!
//! Addon names carry a family prefix (e.g. `r.slope.aspect` is a raster
//! module). The expanded family names are used as subdirectories both in
//! the addon repositories and in Subversion export URLs.

/// Expand a family letter or letters to the family directory name.
///
/// Unknown letters pass through unchanged.
pub fn family_name(letters: &str) -> &str {
    match letters {
        "d" => "display",
        "db" => "db",
        "g" => "general",
        "i" => "imagery",
        "m" => "misc",
        "ps" => "postscript",
        "p" => "paint",
        "r" => "raster",
        "r3" => "raster3d",
        "s" => "sites",
        "t" => "temporal",
        "v" => "vector",
        "wx" => "gui/wxpython",
        other => other,
    }
}

/// Return the family directory name for a full module name.
pub fn module_family(module_name: &str) -> &str {
    let letters = module_name.split_once('.').map_or(module_name, |(l, _)| l);
    family_name(letters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_letters() {
        assert_eq!(family_name("r"), "raster");
        assert_eq!(family_name("v"), "vector");
        assert_eq!(family_name("wx"), "gui/wxpython");
    }

    #[test]
    fn unknown_letters_pass_through() {
        assert_eq!(family_name("xyz"), "xyz");
    }

    #[test]
    fn module_name_maps_to_family() {
        assert_eq!(module_family("r.slope.aspect"), "raster");
        assert_eq!(module_family("v.to.rast"), "vector");
        assert_eq!(module_family("nodots"), "nodots");
    }
}
