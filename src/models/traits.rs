use crate::models::common::*;

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントの初期化
    fn initialize(&mut self, scenario_config: &crate::scenario::ScenarioConfig);

    /// 1ティックの処理実行
    fn tick(&mut self, dt: f64);

    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// エージェントがアクティブかどうか
    fn is_active(&self) -> bool;
}

/// 移動可能なエージェントのインターフェース
pub trait IMovable {
    /// 移動処理
    fn move_agent(&mut self, dt: f64);

    /// 現在位置の取得
    fn get_position(&self) -> Vector2;

    /// 現在速度の取得
    fn get_velocity(&self) -> Vector2;

    /// 位置の設定
    fn set_position(&mut self, position: Vector2);

    /// 速度の設定
    fn set_velocity(&mut self, velocity: Vector2);
}

/// 衝突検知のインターフェース
pub trait ICollision {
    /// 衝突判定
    fn check_collision(&self, target_position: Vector2) -> bool;

    /// miss distanceの計算
    fn calculate_miss_distance(&self, target_position: Vector2) -> f64;

    /// 1ステップ間の相対運動で最接近した距離による衝突判定
    ///
    /// 自身は `previous_position` から現在位置へ、目標は `target_previous` から
    /// `target_position` へ、それぞれ等速で移動したものとして扱います。
    fn check_swept_collision(
        &self,
        previous_position: Vector2,
        target_previous: Vector2,
        target_position: Vector2,
    ) -> bool;
}

/// レーダーが評価する脅威エンティティのインターフェース
///
/// `is_assessed` のリセット（軌道変化時）はエンティティ側の責務です。
pub trait IThreat {
    /// 現在の運動状態
    fn get_motion_state(&self) -> MotionState;

    /// 一度でも視界に入ったかどうか
    fn is_visible(&self) -> bool;

    /// 現在の軌道について評価済みかどうか
    fn is_assessed(&self) -> bool;

    /// 評価済みフラグの設定
    fn set_assessed(&mut self, assessed: bool);

    /// 脅威IDの取得
    fn get_id(&self) -> String;
}

/// 空間検索のレイヤーマスク
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ASTEROID: LayerMask = LayerMask(1 << 0);
    pub const TORPEDO: LayerMask = LayerMask(1 << 1);

    pub fn contains(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

/// 空間検索プロバイダのインターフェース
pub trait ISpatialQuery {
    /// 中心から半径内にある脅威を、プロバイダ固有の順序で返す
    fn query_within_radius(
        &mut self,
        center: Vector2,
        radius: f64,
        layer: LayerMask,
    ) -> Vec<&mut dyn IThreat>;
}

/// 発射設備のインターフェース（応答なしの発射要求）
pub trait ILaunchFacility {
    /// 指定速度で迎撃体を発射
    fn request_launch(&mut self, velocity: Vector2);
}
