use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// vizita (subset read by the feed)
//  ├── vizita_id
//  ├── efectuata
//  ├── data_limita
//  ├── locatie_verificata
//  ├── locatie_valoare
//  ├── Companie
//  │    └── companie_denumire
//  └── TipVizita
//       └── nume_tip_vizita

#[derive(Debug, Clone, Deserialize)]
pub struct VisitRecord {
    pub vizita_id: String,
    pub efectuata: bool,
    /// `YYYY-MM-DD`
    pub data_limita: String,
    pub locatie_verificata: bool,
    pub locatie_valoare: Option<String>,
    #[serde(rename = "Companie")]
    pub companie: Company,
    #[serde(rename = "TipVizita")]
    pub tip_vizita: VisitType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub companie_denumire: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitType {
    pub nume_tip_vizita: String,
}

/// Body of `/vizite/pagination`. `status` is the backend's own result code,
/// independent of the HTTP status.
#[derive(Debug, Clone, Deserialize)]
pub struct VisitPage {
    pub status: u16,
    #[serde(default)]
    pub data: Vec<VisitRecord>,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

/// Flat row the visit list renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitSummary {
    pub visit_id: String,
    #[serde(rename = "companie")]
    pub company: String,
    #[serde(rename = "tip_vizita")]
    pub visit_type: String,
    #[serde(rename = "efectuata")]
    pub completed: bool,
    #[serde(rename = "data_limita")]
    pub deadline: String,
    #[serde(rename = "locatie_verificata")]
    pub location_verified: bool,
    #[serde(rename = "locatie")]
    pub location: Option<String>,
}

impl From<VisitRecord> for VisitSummary {
    fn from(r: VisitRecord) -> Self {
        Self {
            visit_id: r.vizita_id,
            company: r.companie.companie_denumire,
            visit_type: r.tip_vizita.nume_tip_vizita,
            completed: r.efectuata,
            deadline: r.data_limita,
            location_verified: r.locatie_verificata,
            location: r.locatie_valoare,
        }
    }
}

const MONTHS_RO: [&str; 12] = [
    "Ian", "Feb", "Mar", "Apr", "Mai", "Iun", "Iul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

impl VisitSummary {
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.deadline, "%Y-%m-%d").ok()
    }

    pub fn icon_name(&self) -> &'static str {
        match self.visit_type.to_lowercase().as_str() {
            "fizica" => "location-sharp",
            "telefonica" => "call",
            "neprecizat" => "help-circle",
            "locatie neutra" => "people",
            "in punct" => "business",
            _ => "help-circle",
        }
    }

    /// e.g. "Feb 2024"; falls back to the raw deadline if it does not parse.
    pub fn deadline_label(&self) -> String {
        match self.deadline_date() {
            Some(d) => format!("{} {}", MONTHS_RO[d.month0() as usize], d.year()),
            None => self.deadline.clone(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.completed {
            "Efectuată"
        } else {
            "Neefectuată"
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline_date().is_some_and(|d| d < today)
    }
}

/// Counters for the home screen cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisitStats {
    pub total: usize,
    pub completed: usize,
}

impl VisitStats {
    pub fn from_visits(visits: &[VisitSummary]) -> Self {
        Self {
            total: visits.len(),
            completed: visits.iter().filter(|v| v.completed).count(),
        }
    }
}
