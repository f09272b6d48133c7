use sqlx::Executor;

use crate::ddl;
use crate::DbPool;

/// Deterministic demo dataset: a small spread of tenders across regions,
/// estados, and tipos de proceso, with awards, contracts, and one
/// consortium. Used by `licibot seed`, local demos, and integration tests;
/// real data comes from the external ETL pipeline.
pub struct SeedDataset;

/// Row counts the loader guarantees, used by `verify` and test assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedSummary {
    pub licitaciones: i64,
    pub adjudicaciones: i64,
    pub contratos: i64,
    pub consorcios: i64,
}

pub const EXPECTED_SUMMARY: SeedSummary =
    SeedSummary { licitaciones: 12, adjudicaciones: 6, contratos: 2, consorcios: 2 };

const SEED_SQL: &str = "
    DELETE FROM consorcios;
    DELETE FROM contratos;
    DELETE FROM adjudicaciones;
    DELETE FROM licitaciones_cabecera;

    INSERT INTO licitaciones_cabecera
        (id, nomenclatura, entidad, descripcion, region, tipo_proceso, estado,
         moneda, monto_referencial, fecha_convocatoria, anio)
    VALUES
        (1,  'LP-001-2023-MPL',  'MUNICIPALIDAD DE LIMA',        'Rehabilitación de pistas en el cercado',        'LIMA',        'LICITACION PUBLICA',          'ADJUDICADO', 'PEN', 4850000.0, '2023-03-14', 2023),
        (2,  'LP-002-2023-GRL',  'GOBIERNO REGIONAL DE LIMA',    'Construcción de colegio en Huacho',             'LIMA',        'LICITACION PUBLICA',          'ADJUDICADO', 'PEN', 7200000.0, '2023-06-02', 2023),
        (3,  'AS-010-2024-MPL',  'MUNICIPALIDAD DE LIMA',        'Mantenimiento de parques zonales',              'LIMA',        'ADJUDICACION SIMPLIFICADA',   'CONVOCADO',  'PEN',  860000.0, '2024-02-20', 2024),
        (4,  'CP-004-2024-MINSA','MINISTERIO DE SALUD',          'Supervisión de obra hospitalaria',              'LIMA',        'CONCURSO PUBLICO',            'DESIERTO',   'PEN', 1500000.0, '2024-04-11', 2024),
        (5,  'LP-003-2023-GRC',  'GOBIERNO REGIONAL DE CUSCO',   'Mejoramiento de carretera Cusco-Paruro',        'CUSCO',       'LICITACION PUBLICA',          'ADJUDICADO', 'PEN', 9600000.0, '2023-05-09', 2023),
        (6,  'SIE-021-2024-GRC', 'GOBIERNO REGIONAL DE CUSCO',   'Adquisición de combustible para maquinaria',    'CUSCO',       'SUBASTA INVERSA ELECTRONICA', 'CONVOCADO',  'PEN',  420000.0, '2024-01-30', 2024),
        (7,  'AS-015-2024-MPC',  'MUNICIPALIDAD DEL CUSCO',      'Equipamiento de serenazgo',                     'CUSCO',       'ADJUDICACION SIMPLIFICADA',   'CANCELADO',  'PEN',  310000.0, '2024-03-05', 2024),
        (8,  'LP-004-2023-GRA',  'GOBIERNO REGIONAL DE AREQUIPA','Represa menor en el valle de Majes',            'AREQUIPA',    'LICITACION PUBLICA',          'ADJUDICADO', 'PEN', 6100000.0, '2023-08-22', 2023),
        (9,  'CD-007-2024-GRA',  'GOBIERNO REGIONAL DE AREQUIPA','Alquiler de maquinaria de emergencia',          'AREQUIPA',    'CONTRATACION DIRECTA',        'CONTRATADO', 'PEN',  980000.0, '2024-02-08', 2024),
        (10, 'LP-005-2024-GRLL', 'GOBIERNO REGIONAL LA LIBERTAD','Defensa ribereña del río Moche',                'LA LIBERTAD', 'LICITACION PUBLICA',          'ADJUDICADO', 'PEN', 5400000.0, '2024-01-17', 2024),
        (11, 'CP-009-2024-GRP',  'GOBIERNO REGIONAL DE PIURA',   'Elaboración de expediente técnico de drenaje',  'PIURA',       'CONCURSO PUBLICO',            'CONVOCADO',  'PEN',  760000.0, '2024-05-23', 2024),
        (12, 'AS-022-2024-GRSM', 'GOBIERNO REGIONAL SAN MARTIN', 'Caminos vecinales en Moyobamba',                'SAN MARTIN',  'ADJUDICACION SIMPLIFICADA',   'CONVOCADO',  'PEN',  640000.0, '2024-06-12', 2024);

    INSERT INTO adjudicaciones
        (id, licitacion_id, ganador_ruc, ganador_nombre, monto_adjudicado, fecha_adjudicacion)
    VALUES
        (1, 1,  '20100066603', 'CONSTRUCTORA ANDINA S.A.C.',        4790000.0, '2023-05-30'),
        (2, 2,  '20204040406', 'EDIFICACIONES DEL NORTE S.A.',      7150000.0, '2023-08-15'),
        (3, 5,  '20331155770', 'CONSORCIO VIAL PARURO',             9480000.0, '2023-07-21'),
        (4, 8,  '20455566678', 'HIDRAULICA DEL SUR E.I.R.L.',       6045000.0, '2023-10-30'),
        (5, 9,  '20100066603', 'CONSTRUCTORA ANDINA S.A.C.',         975000.0, '2024-02-20'),
        (6, 10, '20512345891', 'INGENIERIA FLUVIAL TRUJILLO S.A.C.', 5320000.0, '2024-03-12');

    INSERT INTO contratos
        (id, adjudicacion_id, numero_contrato, fecha_firma, monto_contratado, estado)
    VALUES
        (1, 5, 'CTR-2024-0107', '2024-03-01',  975000.0, 'VIGENTE'),
        (2, 1, 'CTR-2023-0441', '2023-06-19', 4790000.0, 'LIQUIDADO');

    INSERT INTO consorcios
        (id, adjudicacion_id, nombre_consorcio, miembro_ruc, miembro_nombre, porcentaje_participacion)
    VALUES
        (1, 3, 'CONSORCIO VIAL PARURO', '20331155770', 'CONSTRUCCIONES CUSCO S.A.', 60.0),
        (2, 3, 'CONSORCIO VIAL PARURO', '20669988112', 'MOVIMIENTO DE TIERRAS ANDES E.I.R.L.', 40.0);
";

impl SeedDataset {
    /// Create the fixture schema if needed and load the dataset. Replaces
    /// any previous seed so reloading stays deterministic.
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, sqlx::Error> {
        ddl::create_all(pool).await?;

        let mut tx = pool.begin().await?;
        tx.execute(sqlx::raw_sql(SEED_SQL)).await?;
        tx.commit().await?;

        Self::verify(pool).await
    }

    /// Count the seeded tables; callers compare against `EXPECTED_SUMMARY`.
    pub async fn verify(pool: &DbPool) -> Result<SeedSummary, sqlx::Error> {
        Ok(SeedSummary {
            licitaciones: count(pool, "licitaciones_cabecera").await?,
            adjudicaciones: count(pool, "adjudicaciones").await?,
            contratos: count(pool, "contratos").await?,
            consorcios: count(pool, "consorcios").await?,
        })
    }
}

async fn count(pool: &DbPool, table: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(pool).await
}

#[cfg(test)]
mod tests {
    use crate::connection::connect_with_settings;

    use super::{SeedDataset, EXPECTED_SUMMARY};

    #[tokio::test]
    async fn seed_loads_expected_counts_and_is_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let first = SeedDataset::load(&pool).await.expect("first load");
        assert_eq!(first, EXPECTED_SUMMARY);

        let second = SeedDataset::load(&pool).await.expect("second load");
        assert_eq!(second, EXPECTED_SUMMARY);

        pool.close().await;
    }

    #[tokio::test]
    async fn seed_covers_multiple_regions_and_estados() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        SeedDataset::load(&pool).await.expect("load");

        let regions: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT region) FROM licitaciones_cabecera")
                .fetch_one(&pool)
                .await
                .expect("regions");
        assert!(regions >= 5, "seed should span several regions, got {regions}");

        let lima_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM licitaciones_cabecera WHERE region = 'LIMA'",
        )
        .fetch_one(&pool)
        .await
        .expect("lima count");
        assert_eq!(lima_count, 4);

        let estados: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT estado) FROM licitaciones_cabecera")
                .fetch_one(&pool)
                .await
                .expect("estados");
        assert!(estados >= 4, "seed should span several estados, got {estados}");

        pool.close().await;
    }
}
