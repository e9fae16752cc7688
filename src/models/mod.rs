// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェント・協調相手の基本インターフェース（trait）定義
pub mod traits;

// 迎撃計算（純粋関数）
pub mod intercept;

// 各エージェントモデルの実装
pub mod station;
pub mod radar;
pub mod asteroid;
pub mod launcher;
pub mod torpedo;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use station::SpaceStation;
pub use radar::{Radar, ScanStats};
pub use asteroid::{Asteroid, AsteroidField, AsteroidWave};
pub use launcher::TorpedoLauncher;
pub use torpedo::Torpedo;
