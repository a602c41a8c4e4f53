// INICIO DEL ARCHIVO [apps/chronicler/src/kernel.rs]
/**
 * =================================================================
 * APARATO: CHRONICLER SOVEREIGN KERNEL (V5.0 - LEDGER ACTIVE)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios:
 * el cliente del Ledger Temporal, el estado compartido, el daemon de
 * barrido y el servidor Axum de ingesta.
 * =================================================================
 */

use crate::config::ChroniclerConfig;
use crate::routes::create_ledger_router;
use crate::state::AppState;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tempo_infra_db::StoreClient;
use tracing::{error, info, instrument};

pub struct ChroniclerKernel {
    pub server_network_port: u16,
    pub sweep_interval_seconds: u64,
    pub application_shared_state: AppState,
}

impl ChroniclerKernel {
    /**
     * Realiza la ignición del cliente táctico y el estado compartido.
     * Establece la conexión al Ledger antes de levantar servicios.
     */
    #[instrument(skip(runtime_configuration))]
    pub async fn ignite(runtime_configuration: &ChroniclerConfig) -> Self {
        let database_client = StoreClient::connect(
            &runtime_configuration.database_connection_url,
            runtime_configuration.database_access_token.clone(),
            runtime_configuration.store_tuning(),
        )
        .await
        .expect("FATAL: Ledger link collapse. Ignition aborted.");

        Self {
            server_network_port: runtime_configuration.listening_network_port,
            sweep_interval_seconds: runtime_configuration.sweep_interval_seconds,
            application_shared_state: AppState::new(database_client),
        }
    }

    /**
     * Lanza la ejecución de las operaciones autónomas del Chronicler:
     * el daemon de mantenimiento y el servidor HTTP principal.
     */
    pub async fn launch_ledger_operations(self) {
        let shared_application_state = self.application_shared_state.clone();

        // --- 1. DAEMON DE HIGIENE DEL LEDGER (Sweeper) ---
        shared_application_state
            .maintenance_sweeper
            .clone()
            .spawn_sweeper_daemon(self.sweep_interval_seconds);

        // --- 2. IGNICIÓN DEL SERVIDOR DE INGESTA ---
        let listening_address = SocketAddr::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            self.server_network_port,
        );

        let ledger_router = create_ledger_router(shared_application_state);

        info!("🛰️  [CHRONICLER_ONLINE]: Ingest surface bound to {}.", listening_address);

        match tokio::net::TcpListener::bind(listening_address).await {
            Ok(network_listener) => {
                if let Err(server_fault) = axum::serve(network_listener, ledger_router).await {
                    error!("💀 [SERVER_COLLAPSE]: Ingest surface terminated: {}", server_fault);
                }
            }
            Err(bind_fault) => {
                error!(
                    "💀 [BIND_FAULT]: Port {} unavailable: {}",
                    self.server_network_port, bind_fault
                );
                std::process::exit(1);
            }
        }
    }
}
// FIN DEL ARCHIVO [apps/chronicler/src/kernel.rs]
