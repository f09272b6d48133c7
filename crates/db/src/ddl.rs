//! Fixture schema for the procurement tables the assistant reads.
//!
//! In production these tables are created and populated by the external ETL
//! pipeline; this module only exists so tests, demos, and `licibot seed`
//! can stand up a database with the same shape.

use crate::DbPool;

pub const CREATE_LICITACIONES_CABECERA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS licitaciones_cabecera (
        id INTEGER PRIMARY KEY,
        nomenclatura TEXT NOT NULL UNIQUE,
        entidad TEXT NOT NULL,
        descripcion TEXT NOT NULL,
        region TEXT NOT NULL,
        tipo_proceso TEXT NOT NULL,
        estado TEXT NOT NULL,
        moneda TEXT NOT NULL DEFAULT 'PEN',
        monto_referencial REAL,
        fecha_convocatoria TEXT,
        anio INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_licitaciones_region ON licitaciones_cabecera(region);
    CREATE INDEX IF NOT EXISTS idx_licitaciones_estado ON licitaciones_cabecera(estado);
";

pub const CREATE_ADJUDICACIONES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS adjudicaciones (
        id INTEGER PRIMARY KEY,
        licitacion_id INTEGER NOT NULL,
        ganador_ruc TEXT NOT NULL,
        ganador_nombre TEXT NOT NULL,
        monto_adjudicado REAL NOT NULL,
        fecha_adjudicacion TEXT,
        FOREIGN KEY (licitacion_id) REFERENCES licitaciones_cabecera(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_adjudicaciones_licitacion ON adjudicaciones(licitacion_id);
";

pub const CREATE_CONTRATOS_SQL: &str = "
    CREATE TABLE IF NOT EXISTS contratos (
        id INTEGER PRIMARY KEY,
        adjudicacion_id INTEGER NOT NULL,
        numero_contrato TEXT NOT NULL UNIQUE,
        fecha_firma TEXT,
        monto_contratado REAL NOT NULL,
        estado TEXT NOT NULL,
        FOREIGN KEY (adjudicacion_id) REFERENCES adjudicaciones(id) ON DELETE CASCADE
    );
";

pub const CREATE_CONSORCIOS_SQL: &str = "
    CREATE TABLE IF NOT EXISTS consorcios (
        id INTEGER PRIMARY KEY,
        adjudicacion_id INTEGER NOT NULL,
        nombre_consorcio TEXT NOT NULL,
        miembro_ruc TEXT NOT NULL,
        miembro_nombre TEXT NOT NULL,
        porcentaje_participacion REAL NOT NULL,
        FOREIGN KEY (adjudicacion_id) REFERENCES adjudicaciones(id) ON DELETE CASCADE
    );
";

pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_LICITACIONES_CABECERA_SQL,
    CREATE_ADJUDICACIONES_SQL,
    CREATE_CONTRATOS_SQL,
    CREATE_CONSORCIOS_SQL,
];

pub async fn create_all(pool: &DbPool) -> Result<(), sqlx::Error> {
    for statement_batch in ALL_TABLE_CREATION_SQL {
        sqlx::raw_sql(statement_batch).execute(pool).await?;
    }
    Ok(())
}
