use serde::Serialize;

use flowcheck_store::run_migrations;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::utils::connect_store;
use crate::{OutputArgs, StoreArgs};

#[derive(Serialize)]
struct MigrateResult {
    success: bool,
    message: String,
}

pub async fn migrate_cmd(store: StoreArgs, max_connections: u32, output: OutputArgs) -> i32 {
    let Some(pg) = connect_store(&store, max_connections, &output).await else {
        return exit_codes::RUNTIME_ERROR;
    };

    match run_migrations(pg.pool()).await {
        Ok(()) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("ok: migrations applied");
            } else {
                print_result(
                    output.format,
                    output.quiet,
                    &MigrateResult {
                        success: true,
                        message: "migrations applied".to_string(),
                    },
                );
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &format!("migration failed: {e}"));
            exit_codes::RUNTIME_ERROR
        }
    }
}
