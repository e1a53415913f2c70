// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;

use classcards_core::error::Fallible;

use crate::api::server::ServerConfig;
use crate::api::server::start_server;
use crate::config::ConfigFile;
use crate::config::DEFAULT_DB_PATH;
use crate::config::DEFAULT_HOST;
use crate::config::DEFAULT_PORT;
use crate::db::Database;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Run the API server.
    Serve {
        /// Path to the SQLite database file. Default is classcards.db.
        #[arg(long)]
        db: Option<String>,
        /// The host address to bind to. Default is 127.0.0.1.
        #[arg(long)]
        host: Option<String>,
        /// The port to use for the web server. Default is 8000.
        #[arg(long)]
        port: Option<u16>,
        /// Path to a TOML configuration file.
        #[arg(long)]
        config: Option<String>,
    },
    /// Create the database schema and exit.
    Init {
        /// Path to the SQLite database file. Default is classcards.db.
        #[arg(long)]
        db: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            db,
            host,
            port,
            config,
        } => {
            let file = ConfigFile::load(config.as_deref())?;
            let config = ServerConfig {
                db_path: PathBuf::from(
                    db.or(file.database)
                        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
                ),
                host: host.or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            };
            start_server(config).await
        }
        Command::Init { db } => {
            let path = PathBuf::from(db.unwrap_or_else(|| DEFAULT_DB_PATH.to_string()));
            Database::open(&path)?;
            println!("Initialized database at {}", path.display());
            Ok(())
        }
    }
}
