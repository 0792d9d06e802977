//! 地理围栏
//!
//! 使用球面大圆距离（haversine）判断会员是否在门店附近

use crate::error::{LoyaltyError, Result};
use crate::models::Restaurant;

/// 地球平均半径（米）
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// 两点间的大圆距离（米）
pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// 校验签到位置
///
/// 门店未配置坐标时不做限制；会员未上报坐标时拒绝
pub fn check(
    restaurant: &Restaurant,
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_meters: f64,
) -> Result<()> {
    let (Some(store_lat), Some(store_lng)) = (restaurant.latitude, restaurant.longitude) else {
        return Ok(());
    };
    let (Some(lat), Some(lng)) = (latitude, longitude) else {
        return Err(LoyaltyError::LocationRequired);
    };

    let distance = haversine_meters(lat, lng, store_lat, store_lng);
    if distance > radius_meters {
        return Err(LoyaltyError::GeofenceViolation {
            distance_meters: distance,
            radius_meters,
        });
    }

    Ok(())
}
