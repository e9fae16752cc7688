use std::ops::{Add, Mul, Sub};

/// 2次元ベクトル（位置・速度の両方に使用）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// ベクトルの長さ
    pub fn magnitude(&self) -> f64 {
        self.sqr_magnitude().sqrt()
    }

    /// ベクトルの長さの2乗
    pub fn sqr_magnitude(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// 単位ベクトル化（ゼロベクトルはそのまま返す）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            *self
        }
    }

    /// 内積
    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 2点間距離
    pub fn distance(&self, other: &Vector2) -> f64 {
        (*self - *other).magnitude()
    }

    /// 反時計回りに回転（度）
    pub fn rotate_deg(&self, angle_deg: f64) -> Self {
        let (sin, cos) = math_utils::deg_to_rad(angle_deg).sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// 脅威・迎撃体の瞬間的な運動状態（呼び出し側が所有するスナップショット）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub position: Vector2, // m
    pub velocity: Vector2, // m/s
}

impl MotionState {
    pub fn new(position: Vector2, velocity: Vector2) -> Self {
        Self { position, velocity }
    }
}

/// 防護対象施設の固定位置と安全圏半径
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallationState {
    pub position: Vector2,
    pub safety_radius: f64, // m
}

impl InstallationState {
    pub fn new(position: Vector2, safety_radius: f64) -> Self {
        Self { position, safety_radius }
    }
}

/// エージェントの状態を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentStatus {
    Active,    // アクティブ
    Destroyed, // 迎撃により破壊
    Impacted,  // ステーションに衝突
    Departed,  // 画面外へ離脱
    Inactive,  // 非アクティブ（出現前・寿命切れ）
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians * 180.0 / std::f64::consts::PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        assert_eq!(Vector2::ZERO.normalize(), Vector2::ZERO);
        assert_relative_eq!(Vector2::new(3.0, 4.0).normalize().magnitude(), 1.0);
    }

    #[test]
    fn test_rotate_deg() {
        let rotated = Vector2::new(1.0, 0.0).rotate_deg(90.0);
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_and_dot() {
        let a = Vector2::new(0.0, 100.0);
        let b = Vector2::new(0.0, 0.0);
        assert_eq!(a.distance(&b), 100.0);
        assert_eq!(a.dot(&Vector2::new(0.0, -5.0)), -500.0);
    }
}
