//! Particle types and their default tables.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::core::SimError;

/// Number of particle types.
pub const TYPE_COUNT: usize = 5;

pub const TY_WATER: u8 = 0;
pub const TY_LAVA: u8 = 1;
pub const TY_SOLID: u8 = 2;
pub const TY_FIRE: u8 = 3;
pub const TY_BIO: u8 = 4;

/// Material discriminator stored in attribute lane 0.
#[wasm_bindgen]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleType {
    Water = 0,
    Lava = 1,
    Solid = 2,
    Fire = 3,
    Bio = 4,
}

impl ParticleType {
    pub const ALL: [ParticleType; TYPE_COUNT] = [
        ParticleType::Water,
        ParticleType::Lava,
        ParticleType::Solid,
        ParticleType::Fire,
        ParticleType::Bio,
    ];

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            TY_WATER => Some(ParticleType::Water),
            TY_LAVA => Some(ParticleType::Lava),
            TY_SOLID => Some(ParticleType::Solid),
            TY_FIRE => Some(ParticleType::Fire),
            TY_BIO => Some(ParticleType::Bio),
            _ => None,
        }
    }

    /// Decode the float stored in the attribute buffer.
    ///
    /// Buffers loaded from level files may hold garbage; anything that is not
    /// one of the five ids reads as Water.
    #[inline]
    pub fn from_lane(value: f32) -> Self {
        if value >= 0.0 && value < TYPE_COUNT as f32 {
            Self::from_id(value as u8).unwrap_or(ParticleType::Water)
        } else {
            ParticleType::Water
        }
    }

    #[inline]
    pub fn to_lane(self) -> f32 {
        self as u8 as f32
    }

    /// Water and Bio share buoyancy, player displacement and heat exchange rules.
    #[inline]
    pub fn is_watery(self) -> bool {
        matches!(self, ParticleType::Water | ParticleType::Bio)
    }

    /// Types the audio sampler treats as flowing liquid.
    #[inline]
    pub fn is_liquid(self) -> bool {
        matches!(self, ParticleType::Water | ParticleType::Lava | ParticleType::Bio)
    }

    #[inline]
    pub fn is_static(self) -> bool {
        self == ParticleType::Solid
    }
}

impl TryFrom<u8> for ParticleType {
    type Error = SimError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(SimError::UnknownParticleType(id))
    }
}

/// Bit set of particle types, used by clear/delete operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeMask(u8);

impl TypeMask {
    pub const ALL: TypeMask = TypeMask(0b1_1111);

    #[inline]
    pub fn only(ty: ParticleType) -> Self {
        TypeMask(1 << ty.id())
    }

    #[inline]
    pub fn with(self, ty: ParticleType) -> Self {
        TypeMask(self.0 | (1 << ty.id()))
    }

    #[inline]
    pub fn contains(self, ty: ParticleType) -> bool {
        self.0 & (1 << ty.id()) != 0
    }

    /// Unknown bits are dropped.
    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        TypeMask(bits & Self::ALL.0)
    }
}

impl From<ParticleType> for TypeMask {
    fn from(ty: ParticleType) -> Self {
        TypeMask::only(ty)
    }
}

/// Per-type defaults applied on allocation and re-applied every frame by the
/// attribute updater.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDefaults {
    pub radius: f32,
    pub viscosity: f32,
    /// Initial life; Fire counts this down at unit rate.
    pub life: f32,
}

pub const DEFAULT_TYPE_TABLE: [TypeDefaults; TYPE_COUNT] = [
    // Water
    TypeDefaults { radius: 3.2, viscosity: 1.0, life: 1.0 },
    // Lava
    TypeDefaults { radius: 3.5, viscosity: 6.0, life: 1.0 },
    // Solid
    TypeDefaults { radius: 3.4, viscosity: 1.0, life: 1.0 },
    // Fire
    TypeDefaults { radius: 3.0, viscosity: 1.0, life: 1.0 },
    // Bio
    TypeDefaults { radius: 3.5, viscosity: 12.0, life: 1.0 },
];
