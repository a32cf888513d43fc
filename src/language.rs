//! Localized labels and recommendation texts.
//!
//! Each supported language owns one static [`Catalog`]. Every key is a struct
//! field, so a language without a complete translation does not compile.

use crate::models::RiskLevel;
use serde::{Deserialize, Serialize};

/// Languages the service answers in. Unknown codes resolve to French.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    #[default]
    Fr,
    /// Lingala
    Ln,
    /// Swahili
    Sw,
    /// Tshiluba
    Tsh,
    /// Kikongo
    Kg,
}

impl SupportedLanguage {
    pub const ALL: [SupportedLanguage; 5] = [
        SupportedLanguage::Fr,
        SupportedLanguage::Ln,
        SupportedLanguage::Sw,
        SupportedLanguage::Tsh,
        SupportedLanguage::Kg,
    ];

    /// Resolves a language code, falling back to French for anything unrecognized.
    pub fn resolve(code: Option<&str>) -> Self {
        code.and_then(Self::parse).unwrap_or_default()
    }

    /// Strict lookup, `None` for unsupported codes.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "fr" => Some(SupportedLanguage::Fr),
            "ln" => Some(SupportedLanguage::Ln),
            "sw" => Some(SupportedLanguage::Sw),
            "tsh" => Some(SupportedLanguage::Tsh),
            "kg" => Some(SupportedLanguage::Kg),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SupportedLanguage::Fr => "fr",
            SupportedLanguage::Ln => "ln",
            SupportedLanguage::Sw => "sw",
            SupportedLanguage::Tsh => "tsh",
            SupportedLanguage::Kg => "kg",
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        match self {
            SupportedLanguage::Fr => &FR,
            SupportedLanguage::Ln => &LN,
            SupportedLanguage::Sw => &SW,
            SupportedLanguage::Tsh => &TSH,
            SupportedLanguage::Kg => &KG,
        }
    }

    pub fn risk_label(&self, level: RiskLevel) -> &'static str {
        self.catalog().labels.get(level)
    }
}

/// Display strings for the three risk levels.
#[derive(Debug)]
pub struct RiskLabels {
    pub low: &'static str,
    pub moderate: &'static str,
    pub high: &'static str,
}

impl RiskLabels {
    pub fn get(&self, level: RiskLevel) -> &'static str {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Moderate => self.moderate,
            RiskLevel::High => self.high,
        }
    }
}

/// Recommendation messages, one per rule.
#[derive(Debug)]
pub struct RecommendationTexts {
    pub urgent: &'static str,
    pub exam: &'static str,
    pub hba1c: &'static str,
    pub crp: &'static str,
    pub kidney: &'static str,
    pub nutrition: &'static str,
    pub esr: &'static str,
    pub neuropathy: &'static str,
    pub pvd: &'static str,
    pub hygiene: &'static str,
}

#[derive(Debug)]
pub struct Catalog {
    pub labels: RiskLabels,
    pub recommendations: RecommendationTexts,
}

static FR: Catalog = Catalog {
    labels: RiskLabels {
        low: "Risque Faible",
        moderate: "Risque Modere",
        high: "Risque Eleve",
    },
    recommendations: RecommendationTexts {
        urgent: "Consultation podologique urgente recommandee",
        exam: "Examen des pieds a chaque consultation",
        hba1c: "Controle HbA1c a intensifier (objectif < 7%)",
        crp: "Surveillance CRP - inflammation detectee",
        kidney: "Evaluation de la fonction renale recommandee",
        nutrition: "Evaluation nutritionnelle recommandee (albumine basse)",
        esr: "VS elevee - rechercher une infection ou inflammation",
        neuropathy: "Neuropathie detectee - chaussures therapeutiques recommandees",
        pvd: "Arteriopathie - echo-Doppler arteriel recommande",
        hygiene: "Hygiene des pieds quotidienne et chaussures adaptees",
    },
};

static LN: Catalog = Catalog {
    labels: RiskLabels {
        low: "Likama moke",
        moderate: "Likama ya kati",
        high: "Likama makasi",
    },
    recommendations: RecommendationTexts {
        urgent: "Kokende na monganga ya makolo na lombangu esengami",
        exam: "Kotala makolo na consultation nionso",
        hba1c: "Boyekoli HbA1c esengeli koleka makasi (mokano < 7%)",
        crp: "Kolandela CRP - nzoto epeli emonani",
        kidney: "Bomeki ya bamfigo esengami",
        nutrition: "Bomeki ya bilei esengami (albumine ekiti)",
        esr: "VS etomboki - koluka bokono to nzoto epeli",
        neuropathy: "Bokono ya misisa emonani - sapato ya minganga esengami",
        pvd: "Bokono ya mituka ya makila - echo-Doppler esengami",
        hygiene: "Bopeto ya makolo mokolo na mokolo mpe sapato ya malamu",
    },
};

static SW: Catalog = Catalog {
    labels: RiskLabels {
        low: "Hatari ndogo",
        moderate: "Hatari ya wastani",
        high: "Hatari kubwa",
    },
    recommendations: RecommendationTexts {
        urgent: "Mashauriano ya haraka ya daktari wa miguu yanapendekezwa",
        exam: "Uchunguzi wa miguu kila kliniki",
        hba1c: "Udhibiti wa HbA1c uimarishwe (lengo < 7%)",
        crp: "Ufuatiliaji wa CRP - uvimbe umegunduliwa",
        kidney: "Tathmini ya figo inapendekezwa",
        nutrition: "Tathmini ya lishe inapendekezwa (albumini iko chini)",
        esr: "VS imepanda - tafuta maambukizi au uvimbe",
        neuropathy: "Ugonjwa wa neva umegunduliwa - viatu vya matibabu vinapendekezwa",
        pvd: "Ugonjwa wa mishipa - echo-Doppler inapendekezwa",
        hygiene: "Usafi wa miguu kila siku na viatu vinavyofaa",
    },
};

static TSH: Catalog = Catalog {
    labels: RiskLabels {
        low: "Mpata wa panshi",
        moderate: "Mpata wa pakati",
        high: "Mpata wa muulu",
    },
    recommendations: RecommendationTexts {
        urgent: "Kuya kwa muganga wa makasa mu lubilu kusungidibua",
        exam: "Kutala makasa ku dimeki dionso",
        hba1c: "Dimeki dia HbA1c difwane kukoleshiba (tshisumi < 7%)",
        crp: "Kulama CRP - ditoka dia mubidi dimoneka",
        kidney: "Dimeki dia mifigo disungidibua",
        nutrition: "Dimeki dia bidia disungidibua (albumine idi panshi)",
        esr: "VS ipite - kukeba maladi anyi ditoka",
        neuropathy: "Maladi a misisa amoneka - bisabatu bia minganga bisungidibua",
        pvd: "Maladi a mitshima ya mashi - echo-Doppler yisungidibua",
        hygiene: "Bupupu bua makasa dituku ne dituku ne bisabatu bimpe",
    },
};

static KG: Catalog = Catalog {
    labels: RiskLabels {
        low: "Nsaku ya fioti",
        moderate: "Nsaku ya kati",
        high: "Nsaku ya nene",
    },
    recommendations: RecommendationTexts {
        urgent: "Kwenda na nganga ya makulu na nswalu yitumama",
        exam: "Kutala makulu na kimeki yonso",
        hba1c: "Kimeki ya HbA1c yifweni kukindama (nsuka < 7%)",
        crp: "Kulanda CRP - nitu yitumuki yimonika",
        kidney: "Kimeki ya mfigo yitumama",
        nutrition: "Kimeki ya bilei yitumama (albumine yikitidi)",
        esr: "VS yimatidi - sosa maladi to nitu yitumuki",
        neuropathy: "Maladi ya misisa yimonika - bisabatu bya banganga bitumama",
        pvd: "Maladi ya nzila ya menga - echo-Doppler yitumama",
        hygiene: "Bupeto bwa makulu lumbu na lumbu ye bisabatu bya mbote",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_code_falls_back_to_french() {
        assert_eq!(SupportedLanguage::resolve(Some("en")), SupportedLanguage::Fr);
        assert_eq!(SupportedLanguage::resolve(Some("")), SupportedLanguage::Fr);
        assert_eq!(SupportedLanguage::resolve(None), SupportedLanguage::Fr);
    }

    #[test]
    fn test_codes_round_trip() {
        for lang in SupportedLanguage::ALL {
            assert_eq!(SupportedLanguage::parse(lang.code()), Some(lang));
        }
    }

    #[test]
    fn test_codes_are_case_sensitive() {
        assert_eq!(SupportedLanguage::parse("SW"), None);
        assert_eq!(SupportedLanguage::parse(" sw "), None);
        assert_eq!(SupportedLanguage::resolve(Some("SW")), SupportedLanguage::Fr);
        assert_eq!(SupportedLanguage::resolve(Some("Tsh")), SupportedLanguage::Fr);
    }

    #[test]
    fn test_every_catalog_is_filled() {
        for lang in SupportedLanguage::ALL {
            let c = lang.catalog();
            for level in RiskLevel::ALL {
                assert!(!c.labels.get(level).is_empty(), "{:?} {:?}", lang, level);
            }
            let r = &c.recommendations;
            for text in [
                r.urgent, r.exam, r.hba1c, r.crp, r.kidney, r.nutrition, r.esr, r.neuropathy,
                r.pvd, r.hygiene,
            ] {
                assert!(!text.is_empty(), "{:?}", lang);
            }
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            SupportedLanguage::Sw.risk_label(RiskLevel::High),
            "Hatari kubwa"
        );
        assert_eq!(
            SupportedLanguage::Fr.risk_label(RiskLevel::Low),
            "Risque Faible"
        );
    }
}
