//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (validator derive，逐字段)
//! - min_movement_m < max_jump_m
//! - recent_points + 2 < max_points
//! - stale 阈值大于 tick 周期
//! - relay / pending 队列文件不可相同
//! - file store 必须提供 base_path

use contracts::{StoreType, TrackerBlueprint, TrackerError};
use validator::Validate;

/// 校验 TrackerBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    validate_fields(blueprint)?;
    validate_filter(blueprint)?;
    validate_route(blueprint)?;
    validate_controller(blueprint)?;
    validate_queues(blueprint)?;
    validate_store(blueprint)?;
    Ok(())
}

/// 字段级校验 (derive)
fn validate_fields(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    blueprint.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        TrackerError::config_validation(field, errors.to_string().replace('\n', "; "))
    })
}

/// 校验过滤阈值
fn validate_filter(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    let filter = &blueprint.filter;
    if filter.min_movement_m >= filter.max_jump_m {
        return Err(TrackerError::config_validation(
            "filter.min_movement_m / filter.max_jump_m",
            format!(
                "min_movement_m ({}) must be < max_jump_m ({})",
                filter.min_movement_m, filter.max_jump_m
            ),
        ));
    }
    Ok(())
}

/// 校验路线缓冲区
fn validate_route(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    let route = &blueprint.route;
    if route.recent_points + 2 >= route.max_points {
        return Err(TrackerError::config_validation(
            "route.recent_points",
            format!(
                "recent_points ({}) must leave room for the start point and a sampled middle within max_points ({})",
                route.recent_points, route.max_points
            ),
        ));
    }
    Ok(())
}

/// 校验控制器时序
fn validate_controller(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    let controller = &blueprint.controller;
    if controller.stale_after_s * 1000 <= controller.tick_interval_ms {
        return Err(TrackerError::config_validation(
            "controller.stale_after_s",
            format!(
                "stale_after_s ({}s) must exceed tick_interval_ms ({}ms)",
                controller.stale_after_s, controller.tick_interval_ms
            ),
        ));
    }
    Ok(())
}

/// 校验本地队列
fn validate_queues(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    if blueprint.relay.path == blueprint.pending.path {
        return Err(TrackerError::config_validation(
            "relay.path / pending.path",
            format!(
                "relay and pending queues cannot share a file: {}",
                blueprint.relay.path
            ),
        ));
    }
    Ok(())
}

/// 校验 store 配置
fn validate_store(blueprint: &TrackerBlueprint) -> Result<(), TrackerError> {
    let store = &blueprint.store;
    if store.store_type == StoreType::File {
        let has_base = store
            .params
            .get("base_path")
            .is_some_and(|p| !p.trim().is_empty());
        if !has_base {
            return Err(TrackerError::config_validation(
                format!("store[{}].params.base_path", store.name),
                "file store requires base_path",
            ));
        }
    }
    Ok(())
}
