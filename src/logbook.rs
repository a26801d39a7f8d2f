//! Draft logbook entries assembled from flight summaries.

use chrono::NaiveDate;
use serde::Serialize;

use crate::attribution::AirportAttribution;
use crate::fuel::FuelInvoice;
use crate::summary::FlightSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogbookDraft {
    pub id: u32,
    /// `YYYY-MM-DD`, or the raw recorder date when it cannot be read
    pub date: String,
    /// `YYYY/MM`, used to group entries by month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    pub time: String,
    /// 1-based position within the upload
    pub page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_off: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tach_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobb_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_gal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_dollars: Option<f64>,
}

/// Split `MM/DD/YYYY HH:MM:SS` into an ISO date and the time part
pub fn split_date_time(date_time: &str) -> (String, String) {
    let (date, time) = date_time
        .trim()
        .split_once(' ')
        .unwrap_or((date_time.trim(), ""));
    let iso = NaiveDate::parse_from_str(date, "%m/%d/%Y")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| date.to_string());
    (iso, time.trim().to_string())
}

/// One draft per summary, in order. `attributions` pairs with `summaries` by
/// position; missing entries leave `from`/`to` unset. Fuel goes on the first draft.
pub fn build_drafts(
    summaries: &[FlightSummary],
    attributions: &[AirportAttribution],
    fuel: Option<FuelInvoice>,
) -> Vec<LogbookDraft> {
    summaries
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let (date, time) = split_date_time(&s.date_time);
            let month = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .ok()
                .map(|d| d.format("%Y/%m").to_string());
            let attribution = attributions.get(idx).cloned().unwrap_or_default();
            let fuel = fuel.filter(|_| idx == 0);
            LogbookDraft {
                id: s.id,
                date,
                month,
                time: time.clone(),
                page: idx + 1,
                time_off: s.time_off.clone().or_else(|| Some(time).filter(|t| !t.is_empty())),
                time_in: s.time_in.clone(),
                tach_duration: s.tach_duration,
                hobb_duration: s.hobb_duration,
                from: attribution.from,
                to: attribution.to,
                fuel_gal: fuel.map(|f| f.fuel_gal),
                fuel_dollars: fuel.map(|f| f.fuel_dollars),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u32, date_time: &str) -> FlightSummary {
        FlightSummary {
            id,
            date_time: date_time.to_string(),
            time_off: Some("14:30:00".into()),
            time_in: Some("16:00:00".into()),
            tach_duration: Some(1.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_date_time() {
        assert_eq!(
            split_date_time("06/10/2021 14:30:00"),
            ("2021-06-10".to_string(), "14:30:00".to_string())
        );
        assert_eq!(
            split_date_time("6/1/2021 09:00:00"),
            ("2021-06-01".to_string(), "09:00:00".to_string())
        );
        assert_eq!(split_date_time("garbage"), ("garbage".to_string(), String::new()));
    }

    #[test]
    fn test_build_drafts() {
        let summaries = vec![summary(1, "06/10/2021 14:30:00"), summary(2, "06/11/2021 08:00:00")];
        let attributions = vec![AirportAttribution {
            from: Some("PAO".into()),
            to: Some("SMF".into()),
        }];
        let fuel = FuelInvoice {
            fuel_gal: 20.5,
            fuel_dollars: 150.0,
        };

        let drafts = build_drafts(&summaries, &attributions, Some(fuel));
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].date, "2021-06-10");
        assert_eq!(drafts[0].month.as_deref(), Some("2021/06"));
        assert_eq!(drafts[0].page, 1);
        assert_eq!(drafts[0].from.as_deref(), Some("PAO"));
        assert_eq!(drafts[0].fuel_gal, Some(20.5));
        assert_eq!(drafts[1].page, 2);
        assert_eq!(drafts[1].id, 2);
        assert_eq!(drafts[1].from, None);
        assert_eq!(drafts[1].fuel_dollars, None);
        assert_eq!(drafts[1].time_in.as_deref(), Some("16:00:00"));
    }

    #[test]
    fn test_time_off_falls_back_to_start_time() {
        let s = FlightSummary {
            id: 1,
            date_time: "06/10/2021 14:30:00".into(),
            ..Default::default()
        };
        let drafts = build_drafts(&[s], &[], None);
        assert_eq!(drafts[0].time_off.as_deref(), Some("14:30:00"));

        let json = serde_json::to_value(&drafts[0]).unwrap();
        assert_eq!(json["timeOff"], "14:30:00");
        assert!(json.get("fuelGal").is_none());
    }
}
