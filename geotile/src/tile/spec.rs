//! Tile identity used as the key of every cache tier.

use std::fmt;

/// Identifies a single map tile.
///
/// A tile is fully determined by the plugin that produced it, the map within
/// that plugin, its zoom level, its column/row and an optional version.
/// Equality, hashing and ordering cover every field, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileSpec {
    /// Plugin (provider) name, e.g. `"osm"`
    plugin: String,
    /// Map identifier within the plugin
    map_id: i32,
    /// Zoom level, `-1` marks an invalid spec
    zoom: i32,
    /// Tile column
    x: i32,
    /// Tile row
    y: i32,
    /// Tile version, [`TileSpec::UNVERSIONED`] when the provider has none
    version: i32,
}

impl TileSpec {
    /// Version value meaning "no version".
    pub const UNVERSIONED: i32 = -1;

    /// Create a versioned tile spec.
    pub fn new(plugin: impl Into<String>, map_id: i32, zoom: i32, x: i32, y: i32, version: i32) -> Self {
        Self {
            plugin: plugin.into(),
            map_id,
            zoom,
            x,
            y,
            version,
        }
    }

    /// Create a tile spec without a version.
    pub fn unversioned(plugin: impl Into<String>, map_id: i32, zoom: i32, x: i32, y: i32) -> Self {
        Self::new(plugin, map_id, zoom, x, y, Self::UNVERSIONED)
    }

    /// The sentinel returned when a filename cannot be decoded.
    pub fn invalid() -> Self {
        Self {
            plugin: String::new(),
            map_id: 0,
            zoom: -1,
            x: -1,
            y: -1,
            version: Self::UNVERSIONED,
        }
    }

    /// Returns `false` for the [`TileSpec::invalid`] sentinel.
    pub fn is_valid(&self) -> bool {
        self.zoom != -1
    }

    /// `true` when the spec can be written as a tile file name and decoded
    /// back unchanged.
    ///
    /// The name is `-`/`.` separated, so the plugin may contain neither and
    /// every numeric field must be free of a sign. The version may also be
    /// [`TileSpec::UNVERSIONED`], which is left out of the name.
    pub fn is_encodable(&self) -> bool {
        !self.plugin.is_empty()
            && !self.plugin.contains(['-', '.'])
            && self.map_id >= 0
            && self.zoom >= 0
            && self.x >= 0
            && self.y >= 0
            && (self.version >= 0 || self.version == Self::UNVERSIONED)
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn map_id(&self) -> i32 {
        self.map_id
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_versioned(&self) -> bool {
        self.version != Self::UNVERSIONED
    }
}

impl Default for TileSpec {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for TileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.plugin, self.map_id, self.zoom, self.x, self.y
        )?;
        if self.is_versioned() {
            write!(f, "@v{}", self.version)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_invalid_spec() {
        let spec = TileSpec::invalid();
        assert!(!spec.is_valid());
        assert_eq!(spec.zoom(), -1);
        assert_eq!(spec.version(), TileSpec::UNVERSIONED);
        assert_eq!(TileSpec::default(), spec);
    }

    #[test]
    fn test_unversioned_constructor() {
        let spec = TileSpec::unversioned("osm", 1, 3, 4, 5);
        assert!(spec.is_valid());
        assert!(!spec.is_versioned());
        assert_eq!(spec.plugin(), "osm");
        assert_eq!(spec.map_id(), 1);
        assert_eq!(spec.zoom(), 3);
        assert_eq!(spec.x(), 4);
        assert_eq!(spec.y(), 5);
    }

    #[test]
    fn test_equality_covers_version() {
        let a = TileSpec::new("osm", 1, 3, 4, 5, 1);
        let b = TileSpec::new("osm", 1, 3, 4, 5, 2);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_ordering_is_field_order() {
        let mut set = BTreeSet::new();
        set.insert(TileSpec::unversioned("osm", 2, 0, 0, 0));
        set.insert(TileSpec::unversioned("osm", 1, 9, 9, 9));
        set.insert(TileSpec::unversioned("here", 5, 0, 0, 0));

        let ordered: Vec<_> = set.iter().map(|s| (s.plugin(), s.map_id())).collect();
        assert_eq!(ordered, vec![("here", 5), ("osm", 1), ("osm", 2)]);
    }

    #[test]
    fn test_is_encodable() {
        assert!(TileSpec::unversioned("osm", 0, 0, 0, 0).is_encodable());
        assert!(TileSpec::new("osm", 1, 3, 4, 5, 0).is_encodable());

        assert!(!TileSpec::invalid().is_encodable());
        assert!(!TileSpec::unversioned("osm", -1, 3, 4, 5).is_encodable());
        assert!(!TileSpec::unversioned("osm", 1, 3, -4, 5).is_encodable());
        assert!(!TileSpec::unversioned("osm", 1, 3, 4, -5).is_encodable());
        assert!(!TileSpec::new("osm", 1, 3, 4, 5, -2).is_encodable());
        assert!(!TileSpec::unversioned("open-street", 1, 3, 4, 5).is_encodable());
        assert!(!TileSpec::unversioned("osm.v2", 1, 3, 4, 5).is_encodable());
        assert!(!TileSpec::unversioned("", 1, 3, 4, 5).is_encodable());
    }

    #[test]
    fn test_display() {
        assert_eq!(TileSpec::unversioned("osm", 1, 3, 4, 5).to_string(), "osm/1/3/4/5");
        assert_eq!(TileSpec::new("osm", 1, 3, 4, 5, 7).to_string(), "osm/1/3/4/5@v7");
    }
}
