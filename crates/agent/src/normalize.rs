//! Text normalization shared by the FAQ handler and the intent matcher.
//! Every pattern in the template registry is written against this
//! normalized form: lowercase, accent-folded, punctuation-free, single
//! spaces, domain synonyms expanded.

/// Lowercase, fold Spanish accents, strip punctuation, collapse runs of
/// whitespace.
pub fn normalize(text: &str) -> String {
    let mut output = String::with_capacity(text.len());

    for ch in text.chars().flat_map(char::to_lowercase) {
        match fold_accent(ch) {
            Some(folded) => output.push(folded),
            None if ch.is_alphanumeric() || ch == '_' => output.push(ch),
            None => output.push(' '),
        }
    }

    output.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_accent(ch: char) -> Option<char> {
    match ch {
        'á' | 'à' | 'ä' | 'â' => Some('a'),
        'é' | 'è' | 'ë' | 'ê' => Some('e'),
        'í' | 'ì' | 'ï' | 'î' => Some('i'),
        'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
        'ú' | 'ù' | 'ü' | 'û' => Some('u'),
        'ñ' => Some('n'),
        _ => None,
    }
}

const SYNONYMS: &[(&str, &str)] = &[
    ("procesos de seleccion", "licitaciones"),
    ("proceso de seleccion", "licitacion"),
    ("procesos", "licitaciones"),
    ("proceso", "licitacion"),
    ("convocatorias", "licitaciones"),
    ("convocatoria", "licitacion"),
    ("obtuvo la buena pro", "gano"),
    ("se llevo la buena pro", "gano"),
];

/// Replace known domain synonyms so one template pattern covers the usual
/// phrasings. Longest phrases are listed first so partial overlaps do not
/// garble the text.
pub fn expand_synonyms(normalized: &str) -> String {
    let mut output = format!(" {normalized} ");
    for (synonym, canonical) in SYNONYMS {
        output = output.replace(&format!(" {synonym} "), &format!(" {canonical} "));
    }
    output.trim().to_string()
}

/// Normalization plus synonym expansion, the form the matcher consumes.
pub fn canonicalize(text: &str) -> String {
    expand_synonyms(&normalize(text))
}

#[cfg(test)]
mod tests {
    use super::{canonicalize, expand_synonyms, normalize};

    #[test]
    fn folds_accents_and_strips_punctuation() {
        assert_eq!(
            normalize("¿Cuántas licitaciones hay en Junín?"),
            "cuantas licitaciones hay en junin"
        );
        assert_eq!(normalize("  Hola,   ¿cómo  estás? "), "hola como estas");
    }

    #[test]
    fn keeps_digits_and_underscores() {
        assert_eq!(
            normalize("top 5 de licitaciones_cabecera en 2024"),
            "top 5 de licitaciones_cabecera en 2024"
        );
    }

    #[test]
    fn expands_domain_synonyms_word_aligned() {
        assert_eq!(
            expand_synonyms("cuantos procesos hay en lima"),
            "cuantos licitaciones hay en lima"
        );
        assert_eq!(
            expand_synonyms("cuantos procesos de seleccion hay"),
            "cuantos licitaciones hay"
        );
        // No replacement inside longer words.
        assert_eq!(expand_synonyms("reprocesos hay"), "reprocesos hay");
    }

    #[test]
    fn canonicalize_composes_both_steps() {
        assert_eq!(
            canonicalize("¿Qué empresa obtuvo la buena pro en Cusco?"),
            "que empresa gano en cusco"
        );
    }
}
