use std::net::SocketAddr;

use clap::{Parser, Subcommand};

/// 起動設定 (フラグ > 環境変数 > 既定値)
#[derive(Parser, Debug)]
#[command(name = "groom-scheduler")]
#[command(version, about = "バン x 日付のグルーマー割り当て表を管理する API サーバー", long_about = None)]
pub struct Cli {
    /// SQLite の接続先 (ファイルがなければ作る)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/groom-scheduler.db")]
    pub database_url: String,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// トークン署名用の秘密鍵 (serve では必須)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// トークンの有効期間 (秒)
    #[arg(long, env = "TOKEN_TTL_SECS", default_value_t = 3600)]
    pub token_ttl_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// API サーバーを起動します
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3001")]
        bind_addr: SocketAddr,
    },

    /// 空のグリッドを作ります (van_id 1..=num_vans)
    InitGrid {
        #[arg(long)]
        num_vans: u32,

        #[arg(long)]
        num_days: u32,

        /// YYYY-MM-DD
        #[arg(long)]
        start_date: String,
    },

    /// グリッドの最終日の翌日から end_date まで日付を足します
    AddDays {
        /// YYYY-MM-DD
        #[arg(long)]
        end_date: String,

        /// 省略時は保存済みの最終日
        #[arg(long)]
        start_date: Option<String>,
    },
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn parses_init_grid_flags() {
        let cli = Cli::try_parse_from([
            "groom-scheduler",
            "--database-url",
            "sqlite::memory:",
            "init-grid",
            "--num-vans",
            "2",
            "--num-days",
            "3",
            "--start-date",
            "2025-01-01",
        ])
        .unwrap();

        assert_eq!(cli.database_url, "sqlite::memory:");
        match cli.command {
            Commands::InitGrid { num_vans, num_days, start_date } => {
                assert_eq!((num_vans, num_days), (2, 3));
                assert_eq!(start_date, "2025-01-01");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn serve_requires_a_valid_bind_address() {
        let result = Cli::try_parse_from(["groom-scheduler", "serve", "--bind-addr", "nowhere"]);
        assert!(result.is_err());
    }
}
