//! Glossary of Brazilian investment terms
//!
//! Detects known terms in a question so the advisor can explain them.
//! Terms only match as whole words.

use serde::Serialize;

use crate::text::{contains_term, normalize};

/// A glossary entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlossaryEntry {
    /// Normalized lookup key
    pub term: &'static str,
    pub title: &'static str,
    pub definition: &'static str,
}

const ENTRIES: &[GlossaryEntry] = &[
    GlossaryEntry {
        term: "cdi",
        title: "CDI",
        definition: "Certificado de Depósito Interbancário: taxa de referência da renda fixa no Brasil. \
                     Muitos investimentos pós-fixados rendem um percentual do CDI.",
    },
    GlossaryEntry {
        term: "selic",
        title: "SELIC",
        definition: "Taxa básica de juros da economia. O Tesouro Selic acompanha essa taxa, \
                     com alta liquidez e baixo risco.",
    },
    GlossaryEntry {
        term: "ipca",
        title: "IPCA",
        definition: "Índice oficial de inflação. Títulos atrelados ao IPCA protegem o poder de \
                     compra no longo prazo.",
    },
    GlossaryEntry {
        term: "tesouro selic",
        title: "Tesouro Selic",
        definition: "Título público pós-fixado ligado à SELIC, indicado para reserva de emergência. \
                     IR pela tabela regressiva (22,5% a 15%).",
    },
    GlossaryEntry {
        term: "tesouro ipca+",
        title: "Tesouro IPCA+",
        definition: "Título público híbrido (IPCA + taxa real) para objetivos de médio e longo prazo. \
                     Sujeito à marcação a mercado.",
    },
    GlossaryEntry {
        term: "cdb",
        title: "CDB",
        definition: "Título de renda fixa emitido por bancos: pós-fixado (CDI), prefixado ou IPCA+. \
                     Coberto pelo FGC até os limites vigentes.",
    },
    GlossaryEntry {
        term: "lci",
        title: "LCI",
        definition: "Letra de Crédito Imobiliário. Isenta de IR para pessoa física e lastreada no \
                     setor imobiliário. Geralmente tem carência.",
    },
    GlossaryEntry {
        term: "lca",
        title: "LCA",
        definition: "Letra de Crédito do Agronegócio. Isenta de IR para pessoa física e lastreada \
                     no agronegócio. Geralmente tem carência.",
    },
    GlossaryEntry {
        term: "debentures incentivadas",
        title: "Debêntures incentivadas",
        definition: "Títulos de empresas com isenção de IR para pessoa física quando ligados a \
                     projetos de infraestrutura.",
    },
    GlossaryEntry {
        term: "reserva de emergencia",
        title: "Reserva de emergência",
        definition: "Dinheiro para imprevistos, idealmente 6 meses de despesas, em produtos de alta \
                     liquidez e baixo risco como o Tesouro Selic.",
    },
    GlossaryEntry {
        term: "renda fixa",
        title: "Renda fixa",
        definition: "Investimentos com regras de remuneração definidas, como Tesouro, CDB, LCI e LCA.",
    },
    GlossaryEntry {
        term: "renda variavel",
        title: "Renda variável",
        definition: "Ativos cujo preço oscila, como ações e ETFs. Mais risco e mais retorno esperado \
                     no longo prazo.",
    },
];

/// All known entries, in display order
pub fn entries() -> &'static [GlossaryEntry] {
    ENTRIES
}

/// Look up an entry by term (accents and case are ignored)
pub fn lookup(term: &str) -> Option<&'static GlossaryEntry> {
    let key = normalize(term);
    ENTRIES.iter().find(|e| e.term == key)
}

/// Entries whose term occurs in the question, in display order
pub fn find_terms(text: &str) -> Vec<&'static GlossaryEntry> {
    let text = normalize(text);
    ENTRIES
        .iter()
        .filter(|e| contains_term(&text, e.term, true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_terms() {
        let hits = find_terms("Vale mais a pena CDB ou LCI? E o Tesouro IPCA+?");
        let terms: Vec<_> = hits.iter().map(|e| e.term).collect();
        assert_eq!(terms, vec!["ipca", "tesouro ipca+", "cdb", "lci"]);
    }

    #[test]
    fn test_find_terms_ignores_accents() {
        let hits = find_terms("como montar uma reserva de emergência em renda variável?");
        let terms: Vec<_> = hits.iter().map(|e| e.term).collect();
        assert_eq!(terms, vec!["reserva de emergencia", "renda variavel"]);
    }

    #[test]
    fn test_short_terms_need_whole_words() {
        assert!(find_terms("a lcauda e o cdbx").is_empty());
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("SELIC").map(|e| e.title), Some("SELIC"));
        assert_eq!(lookup("Debêntures Incentivadas").map(|e| e.title), Some("Debêntures incentivadas"));
        assert!(lookup("poupança").is_none());
        assert_eq!(entries().len(), 12);
    }
}
