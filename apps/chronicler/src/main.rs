// [apps/chronicler/src/main.rs]
/*!
 * =================================================================
 * APARATO: CHRONICLER MAIN ENTRY POINT (V5.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DETERMINISTIC IGNITION: El esquema del Ledger se solidifica antes
 *    de abrir el socket TCP, previniendo estados de carrera donde un
 *    cliente ingeste contra tablas aún no cristalizadas.
 * 2. RUNTIME REFINERY: Pila de Tokio elevada (4MB) para absorber las
 *    ráfagas de ingesta sin riesgo de desbordamiento.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use dotenvy::dotenv;
use tempo_chronicler::prelude::*;
use tempo_shared_argos::init_tracing;
use tracing::info;

/**
 * Punto de ignición supremo del binario del Chronicler.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    // Hidrata las variables de .env en el espacio de nombres del proceso.
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD (ARGOS)
    init_tracing("tempo_chronicler");

    // 3. CONFIGURACIÓN DEL RUNTIME SOBERANO CON PROTECCIÓN DE PILA (4MB)
    let runtime_chronicler = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime_chronicler.block_on(async {
        info!("🛰️  [CHRONICLER]: Global ignition sequence starting...");

        // 4. ADQUISICIÓN DE COORDENADAS OPERATIVAS
        let runtime_configuration = ChroniclerConfig::capture_from_environment();

        // 5. CONSTRUCCIÓN DEL KERNEL SOBERANO (ESTRATO L1-APP)
        let kernel_instance = ChroniclerKernel::ignite(&runtime_configuration).await;

        // 6. IGNICIÓN DE OPERACIONES DEL LEDGER
        info!(
            "🚀 [TEMPO_ONLINE]: Ingest engine operational on port {}.",
            kernel_instance.server_network_port
        );
        kernel_instance.launch_ledger_operations().await;

        Ok(())
    })
}
