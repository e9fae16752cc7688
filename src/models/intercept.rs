//! # Intercept モジュール
//!
//! 脅威評価と射撃諸元計算を行う状態を持たない純粋関数群です。
//!
//! - **軌道角**: 脅威の速度方向と「脅威→施設」方向のなす角
//! - **安全圏侵入判定**: 軌道の無限延長線が安全圏半径より内側を通過するか
//! - **迎撃速度**: 等速直線運動する目標に、一定速度の迎撃体が命中する速度ベクトル
//!
//! 迎撃時刻は施設(B)・目標の現在位置(C)・会合点(A)の三角形に余弦定理を適用して求めます。
//!
//! ```text
//! c² = a² + b² − 2ab·cosC
//! a = |BC|（施設と目標の距離）, b = va·t, c = vm·t, C = 軌道角
//! ⇒ (va² − vm²)t² − (2a·va·cosC)t + a² = 0
//! ```

use tracing::{debug, info};
use crate::models::common::{Vector2, math_utils};

/// 二次項係数をゼロとみなす閾値（目標速度 ≒ 迎撃体速度）
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// 迎撃計算の結果（呼び出し毎に生成され、保持されない）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterceptResult {
    pub will_intercept: bool,
    pub velocity: Vector2,       // m/s
    pub time_to_impact: f64,     // s
    pub impact_position: Vector2, // m
}

impl InterceptResult {
    /// 解なしの結果
    ///
    /// 速度・時刻はゼロ、会合点は目標の現在位置とします。
    pub fn none(target_position: Vector2) -> Self {
        Self {
            will_intercept: false,
            velocity: Vector2::ZERO,
            time_to_impact: 0.0,
            impact_position: target_position,
        }
    }
}

/// 目標の軌道と施設方向のなす角（度、0〜180）を計算
///
/// 速度がゼロ、または目標が施設と同一位置にある場合は方向が定まらないため `None` を返します。
pub fn trajectory_angle(installation_pos: Vector2, obj_pos: Vector2, obj_vel: Vector2) -> Option<f64> {
    let to_installation = installation_pos - obj_pos;
    if obj_vel.is_zero() || to_installation.is_zero() {
        return None;
    }

    // 単位ベクトル同士の内積 a·b = cos(θ)
    let cos = obj_vel
        .normalize()
        .dot(&to_installation.normalize())
        .clamp(-1.0, 1.0);

    Some(math_utils::rad_to_deg(cos.acos()))
}

/// 軌道の無限延長線が施設を通過する距離（tan(θ) = 対辺 / 隣辺）
///
/// 軌道角が90度を超える（施設から遠ざかる）場合、または角度が定まらない場合は `None`。
pub fn bypass_distance(installation_pos: Vector2, obj_pos: Vector2, obj_vel: Vector2) -> Option<f64> {
    let angle = trajectory_angle(installation_pos, obj_pos, obj_vel)?;
    if angle > 90.0 {
        return None;
    }

    let adjacent = installation_pos.distance(&obj_pos);
    Some(adjacent * math_utils::deg_to_rad(angle).tan())
}

/// 目標の現在軌道が安全圏に侵入するかを判定
///
/// 現在の軌道を無限に延長して評価するため、安全圏の縁をかすめる軌道は
/// 境界付近で判定が揺れることがあります。境界値（通過距離 == 半径）は非脅威です。
pub fn enters_safety_zone(
    installation_pos: Vector2,
    safety_radius: f64,
    obj_pos: Vector2,
    obj_vel: Vector2,
) -> bool {
    match bypass_distance(installation_pos, obj_pos, obj_vel) {
        Some(opposite) => opposite < safety_radius,
        None => false,
    }
}

/// 迎撃体と目標が会合するまでの時間を計算
///
/// 正の解がない場合は `None`。静止目標は va = 0 として扱います。
pub fn time_to_impact(
    installation_pos: Vector2,
    interceptor_speed: f64,
    target_pos: Vector2,
    target_vel: Vector2,
) -> Option<f64> {
    let a = installation_pos.distance(&target_pos);
    let va = target_vel.magnitude();
    let vm = interceptor_speed;
    let cos_c = trajectory_angle(installation_pos, target_pos, target_vel)
        .map(|angle| math_utils::deg_to_rad(angle).cos())
        .unwrap_or(0.0);

    // (X)t² + (Y)t + (Z) = 0
    let x = va * va - vm * vm;
    let y = -(2.0 * a * va * cos_c);
    let z = a * a;

    if x.abs() <= DEGENERATE_EPSILON {
        // 等速の場合は一次方程式 Y·t + Z = 0
        if y < 0.0 {
            let t = -z / y;
            if t > 0.0 {
                return Some(t);
            }
        }
        info!("迎撃解なし: 迎撃体と目標が等速で、目標が接近していません");
        return None;
    }

    let d = y * y - 4.0 * x * z;
    if d < 0.0 {
        info!("迎撃解なし: 判別式が負です (D = {:.3})", d);
        return None;
    }

    let sqrt_d = d.sqrt();
    let t1 = (-y + sqrt_d) / (2.0 * x);
    let t2 = (-y - sqrt_d) / (2.0 * x);

    // 両方の解が0以下なら、迎撃体は目標に追いつけない
    if t1 <= 0.0 && t2 <= 0.0 {
        info!("迎撃解なし: 迎撃体が目標より遅く、到達できません (t1 = {:.3}, t2 = {:.3})", t1, t2);
        return None;
    }

    // 正の解のうち早い方
    let t = match (t1 > 0.0, t2 > 0.0) {
        (true, true) => t1.min(t2),
        (true, false) => t1,
        _ => t2,
    };
    Some(t)
}

/// 目標の予測軌道上で命中する迎撃体の速度を計算
pub fn compute_intercept_velocity(
    installation_pos: Vector2,
    interceptor_speed: f64,
    target_pos: Vector2,
    target_vel: Vector2,
) -> InterceptResult {
    let Some(t) = time_to_impact(installation_pos, interceptor_speed, target_pos, target_vel) else {
        return InterceptResult::none(target_pos);
    };

    let impact_position = target_pos + target_vel * t;
    let direction = (impact_position - installation_pos).normalize();
    let velocity = direction * interceptor_speed;

    debug!(
        "迎撃解: t = {:.3}s, 会合点 ({:.2}, {:.2}), 速度 ({:.2}, {:.2})",
        t, impact_position.x, impact_position.y, velocity.x, velocity.y
    );

    InterceptResult {
        will_intercept: true,
        velocity,
        time_to_impact: t,
        impact_position,
    }
}
