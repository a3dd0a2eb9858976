//! Node type tags and the per-type enable mask

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

macro_rules! node_types {
    ($($variant:ident, $flag:ident, $bit:literal => $name:literal;)+) => {
        /// Type tag of a partition node
        ///
        /// Names outside the known set are kept verbatim in
        /// [`NodeType::Other`] so they can be reported.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum NodeType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
            /// Type outside the known set
            Other(String),
        }

        impl NodeType {
            /// Canonical type name as it appears in the source data
            pub fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Other(name) => name,
                }
            }

            /// Parse a canonical type name; unknown names become [`NodeType::Other`]
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }

            /// Flag of this type in a [`NodeTypeMask`], `None` for unknown types
            pub fn mask(&self) -> Option<NodeTypeMask> {
                match self {
                    $(Self::$variant => Some(NodeTypeMask::$flag),)+
                    Self::Other(_) => None,
                }
            }
        }

        bitflags! {
            /// Set of node types a selection run is allowed to flag
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            pub struct NodeTypeMask: u64 {
                $(
                    #[doc = concat!("`", $name, "`")]
                    const $flag = 1 << $bit;
                )+
            }
        }
    };
}

node_types! {
    Mesh, MESH, 0 => "worldMeshNode";
    StaticMesh, STATIC_MESH, 1 => "worldStaticMeshNode";
    InstancedMesh, INSTANCED_MESH, 2 => "worldInstancedMeshNode";
    InstancedDestructibleMesh, INSTANCED_DESTRUCTIBLE_MESH, 3 => "worldInstancedDestructibleMeshNode";
    InstancedOccluder, INSTANCED_OCCLUDER, 4 => "worldInstancedOccluderNode";
    DynamicMesh, DYNAMIC_MESH, 5 => "worldDynamicMeshNode";
    BendedMesh, BENDED_MESH, 6 => "worldBendedMeshNode";
    CableMesh, CABLE_MESH, 7 => "worldCableMeshNode";
    ClothMesh, CLOTH_MESH, 8 => "worldClothMeshNode";
    DecorationMesh, DECORATION_MESH, 9 => "worldDecorationMeshNode";
    RotatingMesh, ROTATING_MESH, 10 => "worldRotatingMeshNode";
    TerrainMesh, TERRAIN_MESH, 11 => "worldTerrainMeshNode";
    StaticOccluderMesh, STATIC_OCCLUDER_MESH, 12 => "worldStaticOccluderMeshNode";
    Foliage, FOLIAGE, 13 => "worldFoliageNode";
    FoliageDestruction, FOLIAGE_DESTRUCTION, 14 => "worldFoliageDestructionNode";
    PhysicalDestruction, PHYSICAL_DESTRUCTION, 15 => "worldPhysicalDestructionNode";
    BakedDestruction, BAKED_DESTRUCTION, 16 => "worldBakedDestructionNode";
    Collision, COLLISION, 17 => "worldCollisionNode";
    TerrainCollision, TERRAIN_COLLISION, 18 => "worldTerrainCollisionNode";
    StaticLight, STATIC_LIGHT, 19 => "worldStaticLightNode";
    StaticDecal, STATIC_DECAL, 20 => "worldStaticDecalNode";
    StaticParticle, STATIC_PARTICLE, 21 => "worldStaticParticleNode";
    StaticSoundEmitter, STATIC_SOUND_EMITTER, 22 => "worldStaticSoundEmitterNode";
    StaticFogVolume, STATIC_FOG_VOLUME, 23 => "worldStaticFogVolumeNode";
    StaticSticker, STATIC_STICKER, 24 => "worldStaticStickerNode";
    StaticMarker, STATIC_MARKER, 25 => "worldStaticMarkerNode";
    StaticVectorField, STATIC_VECTOR_FIELD, 26 => "worldStaticVectorFieldNode";
    Effect, EFFECT, 27 => "worldEffectNode";
    Entity, ENTITY, 28 => "worldEntityNode";
    Device, DEVICE, 29 => "worldDeviceNode";
    Prefab, PREFAB, 30 => "worldPrefabNode";
    ReflectionProbe, REFLECTION_PROBE, 31 => "worldReflectionProbeNode";
    AreaShape, AREA_SHAPE, 32 => "worldAreaShapeNode";
    GeometryShape, GEOMETRY_SHAPE, 33 => "worldGeometryShapeNode";
    TriggerArea, TRIGGER_AREA, 34 => "worldTriggerAreaNode";
    Spline, SPLINE, 35 => "worldSplineNode";
    SmartObject, SMART_OBJECT, 36 => "worldSmartObjectNode";
    PopulationSpawner, POPULATION_SPAWNER, 37 => "worldPopulationSpawnerNode";
    AISpot, AI_SPOT, 38 => "worldAISpotNode";
    Mirror, MIRROR, 39 => "worldMirrorNode";
    Socket, SOCKET, 40 => "worldSocketNode";
    WaterPatch, WATER_PATCH, 41 => "worldWaterPatchNode";
    Advertisement, ADVERTISEMENT, 42 => "worldAdvertisementNode";
    DistantLights, DISTANT_LIGHTS, 43 => "worldDistantLightsNode";
    PhysicalTriggerArea, PHYSICAL_TRIGGER_AREA, 44 => "worldPhysicalTriggerAreaNode";
    CollisionArea, COLLISION_AREA, 45 => "worldCollisionAreaNode";
}

impl NodeType {
    /// Placements of this type are addressed individually in results
    pub fn is_instanced(&self) -> bool {
        matches!(self, Self::InstancedMesh | Self::InstancedDestructibleMesh)
    }
}

impl Default for NodeTypeMask {
    fn default() -> Self {
        Self::all()
    }
}
