mod logging;
mod models;
mod scenario;
mod simulation;

use clap::{Arg, Command};
use logging::{init_logging, level_for_verbosity, parse_log_level, LogConfig, LogOutput};
use scenario::*;
use simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("stationdef")
        .version("0.1.0")
        .about("宇宙ステーション防衛シミュレーション (Station Defense)")
        .long_about("宇宙ステーションに接近する小惑星を探知し、魚雷で迎撃するシミュレーション\n\
                     固定時間刻みでレーダー走査・脅威評価・迎撃計算を行います。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test")
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みデモシナリオ（正面接近する小惑星1個）を実行")
                .conflicts_with("info")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .action(clap::ArgAction::SetTrue)
                .help("時間刻みごとに実時間で待機しながら実行")
        )
        .get_matches();

    println!("宇宙ステーション防衛シミュレーション - stationdef v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    let level = matches
        .get_one::<String>("log-level")
        .map(|s| parse_log_level(s))
        .unwrap_or_else(|| level_for_verbosity(verbose_level));
    let output = match matches.get_one::<String>("log-output") {
        Some(s) => match s.parse::<LogOutput>() {
            Ok(output) => output,
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        },
        None => LogOutput::Console,
    };

    let log_config = LogConfig { level, output, ..LogConfig::default() };
    if let Err(e) = init_logging(log_config) {
        eprintln!("エラー: ログ初期化に失敗しました: {}", e);
        std::process::exit(1);
    }

    let realtime = matches.get_flag("realtime");

    let result = if matches.get_flag("test") {
        println!("=== デモシナリオ ===");
        execute_scenario(ScenarioConfig::demo(), verbose_level, realtime)
    } else if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        run_scenario(scenario_path, matches.get_flag("info"), verbose_level, realtime)
    } else {
        // デフォルト動作: 利用可能なシナリオ一覧を表示
        show_default_help();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
    realtime: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    execute_scenario(scenario, verbose_level, realtime)
}

/// シナリオの実行
fn execute_scenario(
    scenario: ScenarioConfig,
    verbose_level: u8,
    realtime: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;

    let report = if realtime {
        simulation.run_realtime()?
    } else {
        simulation.run()?
    };

    println!();
    report.print_summary();

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  stationdef [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>   シナリオファイルを指定して実行");
    println!("  -i, --info              シナリオ情報のみ表示");
    println!("  -t, --test              組み込みデモシナリオを実行");
    println!("  -v, --verbose           詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL> ログレベル (trace, debug, info, warn, error)");
    println!("      --log-output <OUT>  ログ出力先 (console, file, both)");
    println!("      --realtime          実時間で実行");
    println!("  -h, --help              このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/scenario_basic.yaml          - 正面接近と通過する小惑星");
    println!("  scenarios/scenario_course_change.yaml  - 軌道変更による再評価");
    println!("  scenarios/scenario_waves.yaml          - ランダム生成される小惑星波");
    println!();
    println!("例:");
    println!("  stationdef -s scenarios/scenario_basic.yaml");
    println!("  stationdef -s scenarios/scenario_waves.yaml -vv --log-output both");
    println!("  stationdef -s scenarios/scenario_waves.yaml -i");
    println!("  stationdef --test --realtime");
}
