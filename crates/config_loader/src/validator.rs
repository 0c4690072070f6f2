//! Config validation
//!
//! Rules:
//! - at least one supervised vehicle (the primary carries the camera)
//! - vehicle ids unique
//! - fixed spawn indices unique (two strict spawns on one spot cannot
//!   both succeed)
//! - color, when set, parses as "R,G,B" with 0-255 components
//! - pixel_threshold > 0
//! - run duration and connection timeout > 0

use std::collections::HashSet;

use contracts::{ContractError, ScenarioBlueprint};

/// Validate a ScenarioBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    validate_vehicles(blueprint)?;
    validate_camera(blueprint)?;
    validate_stop(blueprint)?;
    validate_timing(blueprint)?;
    Ok(())
}

fn validate_vehicles(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    if blueprint.vehicles.is_empty() {
        return Err(ContractError::config_validation(
            "vehicles",
            "at least one vehicle is required",
        ));
    }

    let mut seen_ids = HashSet::new();
    let mut seen_indices = HashSet::new();
    for vehicle in &blueprint.vehicles {
        if vehicle.id.is_empty() {
            return Err(ContractError::config_validation(
                "vehicles[].id",
                "vehicle id cannot be empty",
            ));
        }
        if !seen_ids.insert(&vehicle.id) {
            return Err(ContractError::config_validation(
                format!("vehicles[id={}]", vehicle.id),
                "duplicate vehicle id",
            ));
        }
        if let Some(index) = vehicle.spawn_index {
            if !seen_indices.insert(index) {
                return Err(ContractError::config_validation(
                    format!("vehicles[{}].spawn_index", vehicle.id),
                    format!("spawn index {index} used twice"),
                ));
            }
        }
        if let Some(color) = &vehicle.color {
            validate_color(&vehicle.id, color)?;
        }
    }
    Ok(())
}

/// "R,G,B" with three 0-255 components
fn validate_color(vehicle_id: &str, color: &str) -> Result<(), ContractError> {
    let parts: Vec<&str> = color.split(',').collect();
    let valid = parts.len() == 3 && parts.iter().all(|part| part.trim().parse::<u8>().is_ok());
    if !valid {
        return Err(ContractError::config_validation(
            format!("vehicles[{vehicle_id}].color"),
            format!("color '{color}' is not an \"R,G,B\" triple"),
        ));
    }
    Ok(())
}

fn validate_camera(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    if blueprint.camera.blueprint.is_empty() {
        return Err(ContractError::config_validation(
            "camera.blueprint",
            "camera blueprint cannot be empty",
        ));
    }
    Ok(())
}

fn validate_stop(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    if blueprint.stop.pixel_threshold == 0 {
        return Err(ContractError::config_validation(
            "stop.pixel_threshold",
            "pixel_threshold must be > 0",
        ));
    }
    Ok(())
}

fn validate_timing(blueprint: &ScenarioBlueprint) -> Result<(), ContractError> {
    if blueprint.run.duration_sec <= 0.0 {
        return Err(ContractError::config_validation(
            "run.duration_sec",
            format!("duration must be > 0, got {}", blueprint.run.duration_sec),
        ));
    }
    if blueprint.world.timeout_sec <= 0.0 {
        return Err(ContractError::config_validation(
            "world.timeout_sec",
            format!("timeout must be > 0, got {}", blueprint.world.timeout_sec),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        CameraConfig, RunConfig, StopConfig, TrafficConfig, VehicleConfig, WorldConfig,
    };

    fn sample_blueprint() -> ScenarioBlueprint {
        ScenarioBlueprint {
            version: Default::default(),
            world: WorldConfig::default(),
            vehicles: vec![VehicleConfig {
                id: "ego".into(),
                blueprint: None,
                color: None,
                spawn_index: Some(162),
            }],
            camera: CameraConfig::default(),
            stop: StopConfig {
                pixel_threshold: 10_000,
            },
            traffic: TrafficConfig { count: 40 },
            run: RunConfig { duration_sec: 20.0 },
        }
    }

    #[test]
    fn sample_is_valid() {
        assert!(validate(&sample_blueprint()).is_ok());
    }

    #[test]
    fn empty_vehicle_list_is_rejected() {
        let mut blueprint = sample_blueprint();
        blueprint.vehicles.clear();
        assert!(validate(&blueprint).is_err());
    }

    #[test]
    fn duplicate_vehicle_id_is_rejected() {
        let mut blueprint = sample_blueprint();
        let mut second = blueprint.vehicles[0].clone();
        second.spawn_index = Some(36);
        blueprint.vehicles.push(second);
        let err = validate(&blueprint).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn duplicate_spawn_index_is_rejected() {
        let mut blueprint = sample_blueprint();
        let mut second = blueprint.vehicles[0].clone();
        second.id = "red".into();
        blueprint.vehicles.push(second);
        let err = validate(&blueprint).unwrap_err();
        assert!(err.to_string().contains("spawn index"));
    }

    #[test]
    fn bad_color_is_rejected() {
        let mut blueprint = sample_blueprint();
        blueprint.vehicles[0].color = Some("blue".into());
        assert!(validate(&blueprint).is_err());

        blueprint.vehicles[0].color = Some("0,0,999".into());
        assert!(validate(&blueprint).is_err());

        blueprint.vehicles[0].color = Some("0,0,240".into());
        assert!(validate(&blueprint).is_ok());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut blueprint = sample_blueprint();
        blueprint.stop.pixel_threshold = 0;
        assert!(validate(&blueprint).is_err());
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let mut blueprint = sample_blueprint();
        blueprint.run.duration_sec = 0.0;
        assert!(validate(&blueprint).is_err());
    }
}
