// Shared tuning constants used by the engine and both frontends.

// Startup state
pub const DEFAULT_AROUSAL: f32 = 0.45;
pub const DEFAULT_VALENCE: f32 = 0.5;
pub const DEFAULT_STABILITY: f32 = 0.6;
pub const DEFAULT_LOAD: f32 = 0.35;
pub const DEFAULT_SOCIAL_DRAIN: f32 = 0.3;
pub const DEFAULT_INTENSITY: f32 = 0.5;

// Transition defaults for control messages that omit `transitionMs`
pub const DEFAULT_STATE_TRANSITION_MS: f32 = 500.0;
pub const DEFAULT_PRESET_TRANSITION_MS: f32 = 700.0;

// Shape layout
pub const SHAPE_RADIUS: f32 = 0.8; // base radius of the point cloud in world units
pub const SHAPE_POINT_SIZE: f32 = 2.4; // idle point sprite size
pub const BACKGROUND_RGB: [f32; 3] = [0.016, 0.027, 0.051]; // #04070d

// Camera
pub const CAMERA_Z: f32 = 6.3;
pub const CAMERA_FOVY_DEG: f32 = 45.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 100.0;
pub const MAX_PIXEL_RATIO: f32 = 2.0;

// Glow (bloom) post-process
pub const BLOOM_ENABLED: bool = true;
pub const BLOOM_STRENGTH: f32 = 0.75;
pub const BLOOM_RADIUS: f32 = 0.6;
pub const BLOOM_THRESHOLD: f32 = 0.2;

// Frame governor
pub const MAX_FRAME_DT_SEC: f32 = 0.05; // clamp after stalls
pub const DEGRADE_FPS_THRESHOLD: f32 = 45.0;
pub const FPS_WINDOW: usize = 30;
pub const FULL_ELEMENT_COUNT: u32 = 2500;
pub const MID_ELEMENT_COUNT: u32 = 1200;
pub const FALLBACK_ELEMENT_COUNT: u32 = 600;

// Rendered share of the tier budget at zero / full density
pub const ELEMENT_DENSITY_FLOOR: f32 = 0.4;
pub const ELEMENT_DENSITY_SPAN: f32 = 0.6;

// Deformer integration
pub const DEFORMER_MAX_STEP_SEC: f32 = 0.05;
pub const ZONE_EDGE_EPSILON: f32 = 0.001; // minimum gap between ordered radii
pub const DETAIL_AMOUNT_MAX: f32 = 0.2;
pub const DETAIL_PER_STRETCH: f32 = 0.2;

// Rendering seed for per-element randomness
pub const DEFAULT_SHAPE_SEED: u64 = 42;
