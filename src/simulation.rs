//! # Simulation モジュール
//!
//! 宇宙ステーション防衛の交戦ループを駆動するシミュレーションエンジンを提供します。
//!
//! 脅威評価と迎撃計算そのものは `models::radar` と `models::intercept` が担い、
//! このエンジンはその協調相手（小惑星の出現・移動、魚雷の飛翔、可視判定、
//! 画面外の後始末）を固定時間刻みで進めます。
//!
//! ## シミュレーション処理順序
//!
//! 各時間刻みにおいて、以下の順序で処理が実行されます：
//!
//! 1. **出現処理**: スポーン時刻に達した小惑星の発射（即時評価対象はここで評価）
//! 2. **小惑星処理**: 予定された軌道変更、移動、衝突判定、可視判定、離脱判定
//! 3. **魚雷処理**: 移動、命中判定、飛翔時間切れ
//! 4. **レーダー処理**: 走査周期に達していれば1周期分の評価と発射要求
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use crate::scenario::ScenarioConfig;
//! use crate::simulation::SimulationEngine;
//!
//! fn run_basic() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScenarioConfig::from_file("scenarios/scenario_basic.yaml")?;
//!     let mut engine = SimulationEngine::new(config, 1);
//!     engine.initialize()?;
//!     engine.run()?.print_summary();
//!     Ok(())
//! }
//! ```

use std::time::Duration;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

use crate::models::*;
use crate::scenario::*;

/// 終了時に詳細表示する最近の評価・発射記録の件数
const RECENT_LOG_COUNT: usize = 5;

/// シミュレーション結果の集計
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub elapsed_time: f64,
    pub step_count: u64,
    pub asteroids_spawned: usize,
    pub asteroids_intercepted: usize,
    pub station_impacts: usize,
    pub asteroids_departed: usize,
    pub torpedoes_launched: usize,
    pub torpedoes_expired: usize,
    pub scan_stats: ScanStats,
}

impl SimulationReport {
    pub fn print_summary(&self) {
        println!("=== シミュレーション結果 ===");
        println!("経過時間: {:.1}秒 ({}ステップ)", self.elapsed_time, self.step_count);
        println!("出現した小惑星: {}個", self.asteroids_spawned);
        println!("  迎撃: {}個", self.asteroids_intercepted);
        println!("  ステーション衝突: {}個", self.station_impacts);
        println!("  画面外へ離脱: {}個", self.asteroids_departed);
        println!("評価数: {} (脅威 {}, 迎撃解なし {})",
                 self.scan_stats.scans, self.scan_stats.threats_flagged, self.scan_stats.no_solution);
        println!("魚雷発射: {}発 (時間切れ {}発)", self.torpedoes_launched, self.torpedoes_expired);
    }
}

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_time: f64,
    pub seed: u64,
    pub step_count: u64,

    pub station: SpaceStation,
    pub radar: Radar,
    pub launcher: TorpedoLauncher,
    pub field: AsteroidField,
    pub torpedoes: Vec<Torpedo>,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    report: SimulationReport,
    rng: ChaCha8Rng,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let station = SpaceStation::from_config("ST001".to_string(), &scenario);
        let radar = Radar::from_config("R001".to_string(), &scenario);
        let launcher = TorpedoLauncher::from_config(&scenario);

        Self {
            current_time: 0.0,
            dt: scenario.sim.dt_s,
            max_time: scenario.sim.t_max_s,
            seed: scenario.sim.seed,
            step_count: 0,
            station,
            radar,
            launcher,
            field: AsteroidField::new(),
            torpedoes: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(scenario.sim.seed),
            scenario_config: scenario,
            verbose_level,
            report: SimulationReport::default(),
        }
    }

    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_tracks()?;
        self.initialize_waves()?;

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  ステーション: {} (安全圏 {:.1}m)", self.station.id, self.station.state.safety_radius);
            info!("  レーダー: {} (半径 {:.1}m, 周期 {:.2}秒)",
                  self.radar.id, self.radar.scanning_radius, self.radar.scanning_interval);
            info!("  発射機: {} (魚雷速度 {:.1}m/s)", self.launcher.id, self.launcher.torpedo_speed);
            info!("  小惑星: {}個", self.field.asteroids.len());
        }

        Ok(())
    }

    fn initialize_tracks(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for track in &self.scenario_config.asteroids {
            let asteroid = Asteroid::from_track(track);

            if self.verbose_level > 1 {
                debug!("小惑星航跡初期化: {} (出現時刻: {:.1}秒)", asteroid.id, asteroid.spawn_time);
            }

            self.field.add(asteroid);
        }

        Ok(())
    }

    fn initialize_waves(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        for wave_config in &self.scenario_config.waves {
            let wave = AsteroidWave::from_config(wave_config, self.station.position());
            let asteroids = wave.generate_asteroids(&mut self.rng);

            if self.verbose_level > 1 {
                debug!("小惑星波初期化: {} ({}個, 出現開始: {:.1}秒)",
                       wave.id, asteroids.len(), wave.spawn_time);
            }

            for asteroid in asteroids {
                self.field.add(asteroid);
            }
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<SimulationReport, Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        while self.current_time < self.max_time {
            self.step();
            self.log_progress();
        }

        Ok(self.finish())
    }

    /// 実時間で実行（時間刻みごとに壁時計で待機）
    pub fn run_realtime(&mut self) -> Result<SimulationReport, Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 (実時間) ===");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        runtime.block_on(async {
            let mut interval = tokio::time::interval(Duration::from_secs_f64(self.dt));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            while self.current_time < self.max_time {
                interval.tick().await;
                self.step();
                self.log_progress();
            }
        });

        Ok(self.finish())
    }

    fn log_progress(&self) {
        if self.verbose_level > 2 {
            trace!("時刻: {:.2}秒 (ステップ: {})", self.current_time, self.step_count);
        }

        if self.step_count % 100 == 0 && self.verbose_level > 0 {
            let progress = (self.current_time / self.max_time) * 100.0;
            info!("進行状況: {:.1}% ({:.1}/{:.1}秒), 飛行中の小惑星: {}個, 魚雷: {}発",
                  progress, self.current_time, self.max_time,
                  self.field.active_count(), self.torpedoes.len());
        }
    }

    fn finish(&mut self) -> SimulationReport {
        self.report.elapsed_time = self.current_time;
        self.report.step_count = self.step_count;
        self.report.torpedoes_launched = self.launcher.get_launch_stats().total_launches;
        self.report.scan_stats = self.radar.get_scan_stats();

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time);
        info!("総ステップ数: {}", self.step_count);

        if self.verbose_level > 1 {
            for scan in self.radar.get_recent_scans(RECENT_LOG_COUNT) {
                debug!("最近の評価: t={:.2} {} 脅威={} 発射={}",
                       scan.timestamp, scan.threat_id, scan.threatening, scan.launched());
            }
            for launch in self.launcher.get_recent_launches(RECENT_LOG_COUNT) {
                debug!("最近の発射: t={:.2} {} 速度=({:.2}, {:.2})",
                       launch.timestamp, launch.torpedo_id, launch.velocity.x, launch.velocity.y);
            }
        }

        self.report.clone()
    }

    pub fn step(&mut self) {
        self.process_spawns();
        self.process_asteroids();
        self.process_torpedoes();

        self.current_time += self.dt;
        self.launcher.tick(self.dt);

        self.process_radar();
        self.cleanup();

        self.step_count += 1;
    }

    fn process_spawns(&mut self) {
        for asteroid in &mut self.field.asteroids {
            if !asteroid.check_spawn(self.current_time) {
                continue;
            }
            self.report.asteroids_spawned += 1;

            // 手動投入された小惑星は可視判定を待たずに評価
            if asteroid.instant_scan {
                self.radar.assess(asteroid, &mut self.launcher);
            }
        }

        self.torpedoes.extend(self.launcher.take_launched());
    }

    fn process_asteroids(&mut self) {
        for asteroid in &mut self.field.asteroids {
            if !asteroid.is_active() {
                continue;
            }

            asteroid.apply_course_changes(self.current_time);
            asteroid.tick(self.dt);

            if self.station.check_impact(&asteroid.id, asteroid.position) {
                asteroid.status = AgentStatus::Impacted;
                self.report.station_impacts += 1;
                continue;
            }

            asteroid.update_visibility(&self.station.viewport);
            if asteroid.has_left_view(&self.station.viewport) {
                debug!(asteroid_id = %asteroid.id, "ASTEROID_DEPARTED: 小惑星が画面外に出ました");
                asteroid.status = AgentStatus::Departed;
                self.report.asteroids_departed += 1;
            }
        }
    }

    fn process_torpedoes(&mut self) {
        let dt = self.dt;

        for torpedo in &mut self.torpedoes {
            if !torpedo.is_active() {
                continue;
            }

            let previous_position = torpedo.position;
            torpedo.tick(dt);

            // 小惑星はこのステップで既に移動済み（等速）
            let hit = self.field.asteroids.iter_mut().find(|a| {
                a.is_active()
                    && torpedo.check_swept_collision(previous_position, a.position - a.velocity * dt, a.position)
            });

            if let Some(asteroid) = hit {
                torpedo.register_hit(&asteroid.id, asteroid.position);
                asteroid.destroy();
                self.report.asteroids_intercepted += 1;
            } else if torpedo.status == AgentStatus::Inactive {
                self.report.torpedoes_expired += 1;
            }
        }
    }

    fn process_radar(&mut self) {
        if self.radar.advance(self.dt) {
            self.radar.tick(&mut self.field, &mut self.launcher);
        }
        self.torpedoes.extend(self.launcher.take_launched());
    }

    fn cleanup(&mut self) {
        self.field.remove_finished();
        self.torpedoes.retain(|t| t.is_active());
    }
}
