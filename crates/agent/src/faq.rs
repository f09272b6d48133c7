//! Fallback handler for messages that are not data-seeking: greetings,
//! courtesy, and a small domain FAQ. Runs before the intent matcher so a
//! plain "hola" never costs a database round trip or a model call.

/// Markers that suggest the operator wants numbers out of the database.
/// A greeting followed by one of these falls through to the matcher.
const DATA_SEEKING_MARKERS: &[&str] = &[
    "cuant", "cuales", "top ", "mayores", "mas grandes", "monto", "total", "suma", "gano",
    "ganador", "ganaron", "lista", "listado", "muestra", "muestrame", "dame", "dime cuant",
];

const GREETING_PREFIXES: &[&str] =
    &["hola", "buenos dias", "buenas tardes", "buenas noches", "buen dia", "saludos"];

const GREETING_ANSWER: &str = "¡Hola! Soy el asistente de contrataciones públicas. \
    Puedo responder preguntas sobre licitaciones, adjudicaciones, contratos y consorcios. \
    Por ejemplo: \"¿Cuántas licitaciones hay en Lima?\" o \"Top 5 licitaciones por monto\".";

const THANKS_ANSWER: &str = "¡De nada! Si tienes otra consulta sobre licitaciones, aquí estoy.";

const FAREWELL_ANSWER: &str = "¡Hasta luego! Vuelve cuando necesites datos de contrataciones.";

const HELP_ANSWER: &str = "Puedo consultar la base de datos de contrataciones públicas: \
    conteos y montos de licitaciones por región, estado o tipo de proceso, mayores \
    adjudicaciones y ganadores. Pregunta en lenguaje natural y te muestro los datos \
    junto con la consulta SQL utilizada.";

/// Phrase-keyed FAQ. Keys are in normalized form (see `normalize`).
const FAQ_ENTRIES: &[(&str, &str)] = &[
    (
        "que es seace",
        "El SEACE es el Sistema Electrónico de Contrataciones del Estado: la plataforma \
         donde las entidades públicas del Perú publican sus procesos de contratación, \
         desde la convocatoria hasta la firma del contrato.",
    ),
    (
        "que es el seace",
        "El SEACE es el Sistema Electrónico de Contrataciones del Estado: la plataforma \
         donde las entidades públicas del Perú publican sus procesos de contratación, \
         desde la convocatoria hasta la firma del contrato.",
    ),
    (
        "que es una licitacion",
        "Una licitación es un proceso de contratación pública en el que una entidad del \
         Estado convoca a proveedores para ejecutar una obra o suministrar bienes, y \
         selecciona la mejor oferta según criterios publicados.",
    ),
    (
        "que es una adjudicacion",
        "La adjudicación (o buena pro) es el resultado de una licitación: el acto por el \
         que la entidad asigna el contrato al postor ganador.",
    ),
    (
        "que es un consorcio",
        "Un consorcio es la unión temporal de dos o más empresas que se presentan juntas \
         a un proceso de contratación, repartiéndose la participación en porcentajes.",
    ),
];

const THANKS_PREFIXES: &[&str] = &["gracias", "muchas gracias", "mil gracias"];

const FAREWELL_PREFIXES: &[&str] = &["adios", "hasta luego", "chau", "nos vemos"];

const HELP_PHRASES: &[&str] =
    &["ayuda", "que puedes hacer", "en que me puedes ayudar", "que sabes hacer", "como funciona"];

#[derive(Clone, Debug, Default)]
pub struct FaqHandler;

impl FaqHandler {
    pub fn new() -> Self {
        Self
    }

    /// Answer a normalized message, or `None` when it is plausibly
    /// data-seeking and should continue down the pipeline.
    pub fn answer(&self, normalized: &str) -> Option<&'static str> {
        if is_data_seeking(normalized) {
            return None;
        }

        for (phrase, answer) in FAQ_ENTRIES {
            if normalized == *phrase || normalized.starts_with(&format!("{phrase} ")) {
                return Some(answer);
            }
        }

        if matches_prefix(normalized, HELP_PHRASES) {
            return Some(HELP_ANSWER);
        }
        if matches_prefix(normalized, THANKS_PREFIXES) {
            return Some(THANKS_ANSWER);
        }
        if matches_prefix(normalized, FAREWELL_PREFIXES) {
            return Some(FAREWELL_ANSWER);
        }
        if matches_prefix(normalized, GREETING_PREFIXES) {
            return Some(GREETING_ANSWER);
        }

        None
    }
}

fn matches_prefix(normalized: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| {
        normalized == *prefix || normalized.starts_with(&format!("{prefix} "))
    })
}

fn is_data_seeking(normalized: &str) -> bool {
    DATA_SEEKING_MARKERS.iter().any(|marker| normalized.contains(marker))
}
