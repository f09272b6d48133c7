//! Static whitelist of the procurement schema the assistant may touch,
//! plus the canonical dimension values used for slot validation.
//!
//! This is configuration data, not user input: the tables are populated by
//! the external ETL pipeline and the assistant only ever reads them. Every
//! identifier that appears in generated SQL must resolve against this
//! inventory, which is what keeps hallucinated columns and unrelated schema
//! objects out of the executor.

use std::collections::HashSet;

#[derive(Clone, Copy, Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Tender headers as published by SEACE.
pub const LICITACIONES_CABECERA: TableDef = TableDef {
    name: "licitaciones_cabecera",
    columns: &[
        "id",
        "nomenclatura",
        "entidad",
        "descripcion",
        "region",
        "tipo_proceso",
        "estado",
        "moneda",
        "monto_referencial",
        "fecha_convocatoria",
        "anio",
    ],
};

/// Award outcomes, one row per awarded item.
pub const ADJUDICACIONES: TableDef = TableDef {
    name: "adjudicaciones",
    columns: &[
        "id",
        "licitacion_id",
        "ganador_ruc",
        "ganador_nombre",
        "monto_adjudicado",
        "fecha_adjudicacion",
    ],
};

pub const CONTRATOS: TableDef = TableDef {
    name: "contratos",
    columns: &[
        "id",
        "adjudicacion_id",
        "numero_contrato",
        "fecha_firma",
        "monto_contratado",
        "estado",
    ],
};

/// Consortium membership behind an award, when the winner is a consortium.
pub const CONSORCIOS: TableDef = TableDef {
    name: "consorcios",
    columns: &[
        "id",
        "adjudicacion_id",
        "nombre_consorcio",
        "miembro_ruc",
        "miembro_nombre",
        "porcentaje_participacion",
    ],
};

pub const TABLES: &[TableDef] =
    &[LICITACIONES_CABECERA, ADJUDICACIONES, CONTRATOS, CONSORCIOS];

/// Canonical region values as stored by the loader (departamentos plus the
/// constitutional province of Callao).
pub const REGIONES: &[&str] = &[
    "AMAZONAS",
    "ANCASH",
    "APURIMAC",
    "AREQUIPA",
    "AYACUCHO",
    "CAJAMARCA",
    "CALLAO",
    "CUSCO",
    "HUANCAVELICA",
    "HUANUCO",
    "ICA",
    "JUNIN",
    "LA LIBERTAD",
    "LAMBAYEQUE",
    "LIMA",
    "LORETO",
    "MADRE DE DIOS",
    "MOQUEGUA",
    "PASCO",
    "PIURA",
    "PUNO",
    "SAN MARTIN",
    "TACNA",
    "TUMBES",
    "UCAYALI",
];

const REGION_ALIASES: &[(&str, &str)] = &[
    ("lima metropolitana", "LIMA"),
    ("provincia de lima", "LIMA"),
    ("la libertad", "LA LIBERTAD"),
    ("trujillo", "LA LIBERTAD"),
    ("chiclayo", "LAMBAYEQUE"),
    ("cuzco", "CUSCO"),
    ("el callao", "CALLAO"),
];

pub const ESTADOS: &[&str] =
    &["CONVOCADO", "ADJUDICADO", "CONTRATADO", "DESIERTO", "CANCELADO", "NULO"];

const ESTADO_ALIASES: &[(&str, &str)] = &[
    ("convocados", "CONVOCADO"),
    ("convocadas", "CONVOCADO"),
    ("en convocatoria", "CONVOCADO"),
    ("adjudicados", "ADJUDICADO"),
    ("adjudicadas", "ADJUDICADO"),
    ("con buena pro", "ADJUDICADO"),
    ("contratados", "CONTRATADO"),
    ("contratadas", "CONTRATADO"),
    ("desiertos", "DESIERTO"),
    ("desiertas", "DESIERTO"),
    ("cancelados", "CANCELADO"),
    ("canceladas", "CANCELADO"),
    ("nulos", "NULO"),
    ("nulas", "NULO"),
];

pub const TIPOS_PROCESO: &[&str] = &[
    "LICITACION PUBLICA",
    "CONCURSO PUBLICO",
    "ADJUDICACION SIMPLIFICADA",
    "SUBASTA INVERSA ELECTRONICA",
    "CONTRATACION DIRECTA",
];

const TIPO_PROCESO_ALIASES: &[(&str, &str)] = &[
    ("licitaciones publicas", "LICITACION PUBLICA"),
    ("concursos publicos", "CONCURSO PUBLICO"),
    ("adjudicaciones simplificadas", "ADJUDICACION SIMPLIFICADA"),
    ("subasta inversa", "SUBASTA INVERSA ELECTRONICA"),
    ("subastas inversas", "SUBASTA INVERSA ELECTRONICA"),
    ("contrataciones directas", "CONTRATACION DIRECTA"),
];

fn canonical_lookup(
    canon: &'static [&'static str],
    aliases: &'static [(&'static str, &'static str)],
    normalized: &str,
) -> Option<&'static str> {
    let needle = normalized.trim();
    if needle.is_empty() {
        return None;
    }

    if let Some(value) = canon.iter().find(|value| value.to_ascii_lowercase() == needle) {
        return Some(value);
    }

    aliases.iter().find(|(alias, _)| *alias == needle).map(|(_, value)| *value)
}

/// Resolve a normalized (lowercased, accent-folded) mention to a canonical
/// region value. Returns `None` for anything outside the enumeration.
pub fn canonical_region(normalized: &str) -> Option<&'static str> {
    canonical_lookup(REGIONES, REGION_ALIASES, normalized)
}

pub fn canonical_estado(normalized: &str) -> Option<&'static str> {
    canonical_lookup(ESTADOS, ESTADO_ALIASES, normalized)
}

pub fn canonical_tipo_proceso(normalized: &str) -> Option<&'static str> {
    canonical_lookup(TIPOS_PROCESO, TIPO_PROCESO_ALIASES, normalized)
}

/// Identifier whitelist derived from the static table inventory. Built once
/// at startup and shared read-only across requests.
#[derive(Clone, Debug)]
pub struct SchemaWhitelist {
    tables: HashSet<&'static str>,
    columns: HashSet<&'static str>,
}

impl SchemaWhitelist {
    pub fn standard() -> Self {
        let tables = TABLES.iter().map(|table| table.name).collect();
        let columns =
            TABLES.iter().flat_map(|table| table.columns.iter().copied()).collect();
        Self { tables, columns }
    }

    pub fn is_table(&self, identifier: &str) -> bool {
        self.tables.contains(identifier.to_ascii_lowercase().as_str())
    }

    pub fn is_column(&self, identifier: &str) -> bool {
        self.columns.contains(identifier.to_ascii_lowercase().as_str())
    }

    pub fn is_known(&self, identifier: &str) -> bool {
        self.is_table(identifier) || self.is_column(identifier)
    }

    /// Compact `table(col, col, ...)` inventory for the generator prompt.
    /// Names only, never data.
    pub fn summary(&self) -> String {
        TABLES
            .iter()
            .map(|table| format!("{}({})", table.name, table.columns.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SchemaWhitelist {
    fn default() -> Self {
        Self::standard()
    }
}
