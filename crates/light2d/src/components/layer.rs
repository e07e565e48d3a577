use serde::{Deserialize, Serialize};

/// Bitmask of scene layers a camera pass draws.
///
/// Layers are indices 0..=31. Each lighting pass renders exactly one
/// layer; the lighting camera's mask is empty between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Highest valid layer index.
    pub const MAX_LAYER: u8 = 31;

    /// Mask that draws nothing.
    pub const NONE: Self = Self(0);

    /// Mask that draws every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Mask containing a single layer. Out-of-range indices give an empty mask.
    pub fn layer(index: u8) -> Self {
        if index > Self::MAX_LAYER {
            return Self::NONE;
        }
        Self(1 << index)
    }

    pub fn contains(self, index: u8) -> bool {
        index <= Self::MAX_LAYER && self.0 & (1 << index) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the layer indices present in the mask, lowest first.
    pub fn layers(self) -> impl Iterator<Item = u8> {
        (0..=Self::MAX_LAYER).filter(move |&i| self.contains(i))
    }
}

/// Scene layers holding each kind of lighting geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingLayers {
    /// Emissive light sprites (point and line lights).
    pub light_sources: u8,
    /// Ambient emitters feeding the temporal ambient field.
    pub ambient_light: u8,
    /// Occluders.
    pub light_obstacles: u8,
}

impl Default for LightingLayers {
    fn default() -> Self {
        Self {
            light_sources: 8,
            ambient_light: 9,
            light_obstacles: 10,
        }
    }
}

impl LightingLayers {
    pub fn light_sources_mask(&self) -> LayerMask {
        LayerMask::layer(self.light_sources)
    }

    pub fn ambient_light_mask(&self) -> LayerMask {
        LayerMask::layer(self.ambient_light)
    }

    pub fn light_obstacles_mask(&self) -> LayerMask {
        LayerMask::layer(self.light_obstacles)
    }

    /// Layers whose light sprites emit: light sources and ambient emitters.
    pub fn emissive_mask(&self) -> LayerMask {
        self.light_sources_mask().union(self.ambient_light_mask())
    }

    /// First layer index that does not fit in a [`LayerMask`], if any.
    pub fn out_of_range(&self) -> Option<u8> {
        [self.light_sources, self.ambient_light, self.light_obstacles]
            .into_iter()
            .find(|&l| l > LayerMask::MAX_LAYER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_layer_mask() {
        let mask = LayerMask::layer(3);
        assert_eq!(mask.0, 0b1000);
        assert!(mask.contains(3));
        assert!(!mask.contains(2));
        assert_eq!(mask.layers().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn emissive_mask_joins_sources_and_ambient() {
        let mask = LightingLayers::default().emissive_mask();
        assert_eq!(mask.layers().collect::<Vec<_>>(), vec![8, 9]);
        assert!(LayerMask::ALL.contains(LayerMask::MAX_LAYER));
    }

    #[test]
    fn out_of_range_layer_is_empty() {
        assert!(LayerMask::layer(32).is_empty());
        assert!(!LayerMask::NONE.contains(40));
    }

    #[test]
    fn default_layers_are_distinct() {
        let layers = LightingLayers::default();
        assert_ne!(layers.light_sources_mask(), layers.ambient_light_mask());
        assert_ne!(layers.ambient_light_mask(), layers.light_obstacles_mask());
        assert!(layers.out_of_range().is_none());
    }

    #[test]
    fn detects_out_of_range_layer() {
        let layers = LightingLayers {
            ambient_light: 40,
            ..Default::default()
        };
        assert_eq!(layers.out_of_range(), Some(40));
    }
}
