use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use thiserror::Error;

use crate::models::radar::ScanOrder;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Velocity2D {
    pub vx_mps: f64,
    pub vy_mps: f64,
}

/// 可視判定に使う表示領域
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RegionRect {
    pub xmin_m: f64,
    pub xmax_m: f64,
    pub ymin_m: f64,
    pub ymax_m: f64,
}

/// 宇宙ステーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    pub position: Position2D,
    #[serde(default = "default_safety_radius")]
    pub safety_radius_m: f64,
    #[serde(default = "default_hull_radius")]
    pub hull_radius_m: f64,
    pub viewport: RegionRect,
}

/// レーダー設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RadarConfig {
    #[serde(default = "default_scanning_interval")]
    pub scanning_interval_s: f64,
    #[serde(default = "default_scanning_radius")]
    pub scanning_radius_m: f64,
    #[serde(default = "default_assessments_per_scan")]
    pub assessments_per_scan: u32,
    #[serde(default)]
    pub scan_order: ScanOrder,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            scanning_interval_s: default_scanning_interval(),
            scanning_radius_m: default_scanning_radius(),
            assessments_per_scan: default_assessments_per_scan(),
            scan_order: ScanOrder::default(),
        }
    }
}

/// 魚雷発射機設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LauncherConfig {
    #[serde(default = "default_launcher_id")]
    pub id: String,
    #[serde(default = "default_torpedo_speed")]
    pub torpedo_speed_mps: f64,
    #[serde(default = "default_hit_radius")]
    pub hit_radius_m: f64,
    #[serde(default = "default_max_flight_time")]
    pub max_flight_time_s: f64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            id: default_launcher_id(),
            torpedo_speed_mps: default_torpedo_speed(),
            hit_radius_m: default_hit_radius(),
            max_flight_time_s: default_max_flight_time(),
        }
    }
}

/// 軌道変更イベント（小惑星同士の衝突の代替）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CourseChangeConfig {
    pub time_s: f64,
    pub velocity: Velocity2D,
}

/// 個別に定義された小惑星の航跡
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AsteroidTrackConfig {
    pub id: String,
    #[serde(default)]
    pub spawn_time_s: f64,
    pub position: Position2D,
    pub velocity: Velocity2D,
    /// 出現直後に可視判定を待たずに評価する（手動投入された小惑星）
    #[serde(default)]
    pub instant_scan: bool,
    #[serde(default)]
    pub course_changes: Vec<CourseChangeConfig>,
}

/// ランダム生成される小惑星の波
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AsteroidWaveConfig {
    pub id: String,
    #[serde(default)]
    pub spawn_time_s: f64,
    pub count: u32,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_s: f64,
    #[serde(default = "default_spawn_circle_radius")]
    pub spawn_circle_radius_m: f64,
    #[serde(default = "default_spawn_angle_range")]
    pub spawn_angle_range_deg: f64,
    #[serde(default = "default_min_speed")]
    pub min_speed_mps: f64,
    #[serde(default = "default_max_speed")]
    pub max_speed_mps: f64,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub station: StationConfig,
    #[serde(default)]
    pub radar: RadarConfig,
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub asteroids: Vec<AsteroidTrackConfig>,
    #[serde(default)]
    pub waves: Vec<AsteroidWaveConfig>,
}

fn default_safety_radius() -> f64 { 10.0 }
fn default_hull_radius() -> f64 { 1.5 }
fn default_scanning_interval() -> f64 { 1.0 }
fn default_scanning_radius() -> f64 { 35.0 }
fn default_assessments_per_scan() -> u32 { 1 }
fn default_launcher_id() -> String { "L001".to_string() }
fn default_torpedo_speed() -> f64 { 15.0 }
fn default_hit_radius() -> f64 { 1.0 }
fn default_max_flight_time() -> f64 { 10.0 }
fn default_spawn_interval() -> f64 { 2.0 }
fn default_spawn_circle_radius() -> f64 { 50.0 }
fn default_spawn_angle_range() -> f64 { 35.0 }
fn default_min_speed() -> f64 { 3.0 }
fn default_max_speed() -> f64 { 10.0 }

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 組み込みデモシナリオ（正面から接近する小惑星1個）
    pub fn demo() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "demo".to_string(),
                description: "正面接近する小惑星の迎撃".to_string(),
            },
            sim: SimulationConfig { dt_s: 0.02, t_max_s: 30.0, seed: 0 },
            station: StationConfig {
                position: Position2D { x_m: 0.0, y_m: 0.0 },
                safety_radius_m: default_safety_radius(),
                hull_radius_m: default_hull_radius(),
                viewport: RegionRect { xmin_m: -40.0, xmax_m: 40.0, ymin_m: -40.0, ymax_m: 40.0 },
            },
            radar: RadarConfig::default(),
            launcher: LauncherConfig::default(),
            asteroids: vec![AsteroidTrackConfig {
                id: "A001".to_string(),
                spawn_time_s: 0.0,
                position: Position2D { x_m: 0.0, y_m: 45.0 },
                velocity: Velocity2D { vx_mps: 0.0, vy_mps: -5.0 },
                instant_scan: false,
                course_changes: Vec::new(),
            }],
            waves: Vec::new(),
        }
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::Validation("dt_s must be positive".to_string()));
        }
        if self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::Validation("t_max_s must be positive".to_string()));
        }

        let viewport = &self.station.viewport;
        if viewport.xmin_m >= viewport.xmax_m || viewport.ymin_m >= viewport.ymax_m {
            return Err(ScenarioError::Validation("Invalid viewport bounds".to_string()));
        }
        if self.station.safety_radius_m < 0.0 || self.station.hull_radius_m < 0.0 {
            return Err(ScenarioError::Validation("Station radii must be non-negative".to_string()));
        }

        if self.radar.scanning_interval_s <= 0.0 {
            return Err(ScenarioError::Validation("scanning_interval_s must be positive".to_string()));
        }
        if self.radar.scanning_radius_m < 0.0 {
            return Err(ScenarioError::Validation("scanning_radius_m must be non-negative".to_string()));
        }
        if self.radar.assessments_per_scan == 0 {
            return Err(ScenarioError::Validation("assessments_per_scan must be at least 1".to_string()));
        }

        if self.launcher.torpedo_speed_mps <= 0.0 {
            return Err(ScenarioError::Validation("torpedo_speed_mps must be positive".to_string()));
        }
        if self.launcher.hit_radius_m < 0.0 || self.launcher.max_flight_time_s <= 0.0 {
            return Err(ScenarioError::Validation("Invalid torpedo hit radius or flight time".to_string()));
        }

        for track in &self.asteroids {
            if track.spawn_time_s >= self.sim.t_max_s {
                return Err(ScenarioError::Validation(
                    format!("Asteroid {} spawn time {} >= simulation time {}",
                            track.id, track.spawn_time_s, self.sim.t_max_s)
                ));
            }
            if track.course_changes.iter().any(|c| c.time_s < track.spawn_time_s) {
                return Err(ScenarioError::Validation(
                    format!("Asteroid {} has a course change before its spawn time", track.id)
                ));
            }
        }

        for wave in &self.waves {
            if wave.spawn_time_s >= self.sim.t_max_s {
                return Err(ScenarioError::Validation(
                    format!("Wave {} spawn time {} >= simulation time {}",
                            wave.id, wave.spawn_time_s, self.sim.t_max_s)
                ));
            }
            if wave.spawn_interval_s < 0.0 || wave.spawn_circle_radius_m <= 0.0 || wave.spawn_angle_range_deg < 0.0 {
                return Err(ScenarioError::Validation(
                    format!("Wave {} has an invalid spawn interval, circle radius or angle range", wave.id)
                ));
            }
            if wave.min_speed_mps <= 0.0 || wave.min_speed_mps > wave.max_speed_mps {
                return Err(ScenarioError::Validation(
                    format!("Wave {} speed range {}..{} is invalid",
                            wave.id, wave.min_speed_mps, wave.max_speed_mps)
                ));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒", self.sim.t_max_s);
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== ステーション ===");
        println!("位置: ({:.1}, {:.1})", self.station.position.x_m, self.station.position.y_m);
        println!("安全圏半径: {:.1}m", self.station.safety_radius_m);
        println!("レーダー: 半径 {:.1}m / 間隔 {:.2}秒 / 順序 {:?}",
                 self.radar.scanning_radius_m, self.radar.scanning_interval_s, self.radar.scan_order);
        println!("魚雷速度: {:.1}m/s", self.launcher.torpedo_speed_mps);
        println!();

        println!("=== 小惑星 ===");
        println!("個別航跡: {}個", self.asteroids.len());
        let total_wave: u32 = self.waves.iter().map(|w| w.count).sum();
        println!("ランダム波: {}波 (計{}個)", self.waves.len(), total_wave);
        for wave in &self.waves {
            println!("  {}: {}個 (出現開始: {:.1}秒, 間隔: {:.1}秒)",
                     wave.id, wave.count, wave.spawn_time_s, wave.spawn_interval_s);
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
