// INICIO DEL ARCHIVO [apps/chronicler/src/bin/migrator.rs]
/**
 * =================================================================
 * APARATO: LEGACY MIGRATOR CLI (V3.1 - ONE SHOT)
 * CLASIFICACIÓN: OPS INFRASTRUCTURE (ESTRATO L6)
 * RESPONSABILIDAD: IMPORTACIÓN ÚNICA DEL SNAPSHOT BINARIO HEREDADO
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. ONE SHOT COVENANT: El migrador corre una vez, fuera de la operación
 *    nominal, contra un Ledger vacío o idempotentemente receptivo.
 * 2. VERDICT EXIT CODE: Un resultado con integridad inválida termina con
 *    código distinto de cero para la visibilidad de los pipelines de Ops.
 * 3. RUNTIME REFINERY: Pila de Tokio elevada (4MB) para decodificar
 *    snapshots voluminosos sin riesgo de desbordamiento.
 * =================================================================
 */

use dotenvy::dotenv;
use tempo_chronicler::prelude::*;
use tempo_chronicler::services::migration::decode_snapshot;
use tempo_infra_db::StoreClient;
use tempo_shared_argos::init_tracing;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // 1. CARGA DE ENTORNO OPERATIVO
    dotenv().ok();
    init_tracing("tempo_migrator");

    // 2. CONFIGURACIÓN DEL RUNTIME SOBERANO
    let runtime_migrator = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime_migrator.block_on(async {
        info!("📦 [MIGRATOR]: Legacy snapshot import sequence starting...");

        // 3. LOCALIZACIÓN DEL SNAPSHOT HEREDADO
        let snapshot_path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var("TEMPO_SNAPSHOT_PATH").ok())
            .expect("CRITICAL_FAULT: snapshot path undefined (arg or TEMPO_SNAPSHOT_PATH).");

        let binary_burst = std::fs::read(&snapshot_path)
            .map_err(|read_fault| anyhow::anyhow!("SNAPSHOT_UNREADABLE [{}]: {}", snapshot_path, read_fault))?;

        let legacy_snapshot = decode_snapshot(&binary_burst)
            .map_err(|decode_fault| anyhow::anyhow!("{}", decode_fault))?;

        // 4. HANDSHAKE CON EL LEDGER TEMPORAL
        let runtime_configuration = ChroniclerConfig::capture_from_environment();
        let database_client = match StoreClient::connect(
            &runtime_configuration.database_connection_url,
            runtime_configuration.database_access_token.clone(),
            runtime_configuration.store_tuning(),
        )
        .await
        {
            Ok(client) => client,
            Err(connection_fault) => {
                error!("❌ [UPLINK_FAULT]: Failed to establish Ledger link: {}", connection_fault);
                return Err(anyhow::anyhow!(connection_fault.to_string()));
            }
        };

        // 5. EJECUCIÓN DE LA IMPORTACIÓN ÚNICA
        let application_state = AppState::new(database_client);
        let migration_report = application_state
            .migration_engine
            .execute(legacy_snapshot)
            .await
            .map_err(|migration_fault| anyhow::anyhow!("{}", migration_fault))?;

        println!("{}", serde_json::to_string_pretty(&migration_report)?);

        if migration_report.data_integrity_valid {
            info!("✨ [MIGRATOR_SUCCESS]: Legacy state is now Ledger level.");
            Ok(())
        } else {
            error!("💀 [MIGRATOR_SUSPECT]: Import flagged invalid. Inspect the report.");
            std::process::exit(2);
        }
    })
}
// FIN DEL ARCHIVO [apps/chronicler/src/bin/migrator.rs]
