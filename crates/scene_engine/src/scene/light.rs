//! Light sources registered with the scene manager
//!
//! Lights are plain data. The manager only stores them; shading is the
//! render backend's business.

use crate::foundation::math::Vec3;
use std::sync::{Arc, RwLock};

/// Light shared between the application and the scene manager
pub type LightPtr = Arc<RwLock<LightSource>>;

/// Kinds of light source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Constant term applied everywhere
    Ambient,
    /// Omnidirectional light at a position
    Point,
    /// Parallel rays (sunlight)
    Directional,
    /// Cone of light from a position
    Spot,
    /// Spherical area light
    SphereArea,
    /// Capsule-shaped area light
    TubeArea,
}

/// A light source
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    /// The type of light
    pub light_type: LightType,
    /// RGB colour (0.0 to 1.0)
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// World-space position (point, spot, area lights)
    pub position: Vec3,
    /// Normalized world-space direction (directional, spot)
    pub direction: Vec3,
    /// Maximum reach (point, spot)
    pub range: f32,
    /// Inner cone angle in radians (spot)
    pub inner_cone: f32,
    /// Outer cone angle in radians (spot)
    pub outer_cone: f32,
    /// Whether the light contributes
    pub enabled: bool,
}

impl LightSource {
    fn base(light_type: LightType, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type,
            color,
            intensity,
            position: Vec3::zeros(),
            direction: Vec3::new(0.0, -1.0, 0.0),
            range: 0.0,
            inner_cone: 0.0,
            outer_cone: 0.0,
            enabled: true,
        }
    }

    /// Ambient light
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self::base(LightType::Ambient, color, intensity)
    }

    /// Directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.normalize(),
            ..Self::base(LightType::Directional, color, intensity)
        }
    }

    /// Point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            position,
            range,
            ..Self::base(LightType::Point, color, intensity)
        }
    }

    /// Spot light; cone angles in radians
    pub fn spot(position: Vec3, direction: Vec3, color: Vec3, intensity: f32, range: f32, inner_cone: f32, outer_cone: f32) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            range,
            inner_cone,
            outer_cone,
            ..Self::base(LightType::Spot, color, intensity)
        }
    }

    /// Wrap into a shared handle
    pub fn into_ptr(self) -> LightPtr {
        Arc::new(RwLock::new(self))
    }

    /// Whether position matters for this light
    pub fn is_positional(&self) -> bool {
        !matches!(self.light_type, LightType::Ambient | LightType::Directional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_normalizes() {
        let light = LightSource::directional(Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0);
        assert_relative_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0));
        assert!(!light.is_positional());
    }

    #[test]
    fn test_spot_keeps_cone() {
        let light = LightSource::spot(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.9, 0.8),
            2.0,
            20.0,
            0.2,
            0.4,
        );
        assert_eq!(light.light_type, LightType::Spot);
        assert!(light.is_positional());
        assert_relative_eq!(light.outer_cone, 0.4);
        assert!(light.enabled);
    }
}
