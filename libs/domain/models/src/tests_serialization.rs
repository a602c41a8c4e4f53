// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V3.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON Y BINARIA DEL DOMINIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WIRE PARITY: Valida que las etiquetas snake_case de estados y tipos
 *    de actividad sobrevivan el roundtrip JSON sin deriva de esquema.
 * 2. SNAPSHOT PARITY: Certifica que el contrato binario heredado se
 *    reconstruya bit-perfecto bajo la configuración Little-Endian fijada.
 * 3. HYGIENE: Erradicación total de 'crate::' por nombres nominales soberanos.
 * =================================================================
 */
