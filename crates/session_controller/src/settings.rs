//! Controller runtime settings

use contracts::{ControllerConfig, EngineConfig, LocationSettings, TrackerBlueprint};

/// Settings the controller needs from the full blueprint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSettings {
    pub engine: EngineConfig,
    pub location: LocationSettings,
    pub controller: ControllerConfig,
}

impl ControllerSettings {
    pub fn from_blueprint(blueprint: &TrackerBlueprint) -> Self {
        Self {
            engine: blueprint.engine_config(),
            location: blueprint.location.clone(),
            controller: blueprint.controller.clone(),
        }
    }
}

impl From<&TrackerBlueprint> for ControllerSettings {
    fn from(blueprint: &TrackerBlueprint) -> Self {
        Self::from_blueprint(blueprint)
    }
}
