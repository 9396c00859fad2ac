//! MCP Tool Handlers
//!
//! Implements the tool dispatch layer on top of the Odoo client.

use crate::client::OdooClient;
use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::protocol::ToolCallResult;

pub struct ToolHandlers {
    odoo: Arc<OdooClient>,
}

impl ToolHandlers {
    pub fn new(odoo: Arc<OdooClient>) -> Self {
        Self { odoo }
    }

    /// Handle a tool call, returning a uniform success/error envelope.
    pub async fn handle(&self, name: &str, arguments: Value) -> ToolCallResult {
        debug!(tool = name, "dispatching tool call");
        match self.dispatch(name, arguments).await {
            Ok(value) => ToolCallResult::json(&value),
            Err(e) => ToolCallResult::json(&json!({
                "success": false,
                "error": e.to_string(),
            })),
        }
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "execute_method" => self.execute_method(arguments).await,
            "search_employee" => self.search_employee(arguments).await,
            "search_holidays" => self.search_holidays(arguments).await,
            "search_partner_by_name" => self.search_partner_by_name(arguments).await,
            "create_customer" => self.create_customer(arguments).await,
            "create_lead" => self.create_lead(arguments).await,
            "search_calendar_events" => self.search_calendar_events(arguments).await,
            "create_calendar_event" => self.create_calendar_event(arguments).await,
            _ => Err(anyhow!("Unknown tool: {}", name)),
        }
    }

    async fn execute_method(&self, args: Value) -> Result<Value> {
        let model = require_str(&args, "model")?;
        let method = require_str(&args, "method")?;
        let positional = match args.get("args") {
            Some(Value::Array(a)) => a.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other.clone()],
        };
        let kwargs = match args.get("kwargs") {
            Some(Value::Object(m)) => m.clone(),
            _ => Map::new(),
        };

        let result = self
            .odoo
            .execute_kw(&model, &method, positional, kwargs)
            .await?;
        Ok(json!({ "success": true, "result": result }))
    }

    async fn search_employee(&self, args: Value) -> Result<Value> {
        let name = require_str(&args, "name")?;
        let limit = int_arg(&args, "limit").unwrap_or(20);

        let mut kwargs = Map::new();
        kwargs.insert("name".into(), json!(name));
        kwargs.insert("limit".into(), json!(limit));

        let result = self
            .odoo
            .execute_kw("hr.employee", "name_search", Vec::new(), kwargs)
            .await?;
        Ok(json!({ "success": true, "result": result }))
    }

    async fn search_holidays(&self, args: Value) -> Result<Value> {
        let start_date = require_str(&args, "start_date")?;
        let end_date = require_str(&args, "end_date")?;
        let employee_id = int_arg(&args, "employee_id");

        let start = parse_date(&start_date, "start_date")?;
        let end = parse_date(&end_date, "end_date")?;
        if start > end {
            return Err(anyhow!("start_date must not be after end_date"));
        }

        // Leaves beginning the day before can still overlap the range.
        let query_start = start - Duration::days(1);
        let mut domain = vec![
            json!("&"),
            json!(["start_datetime", "<=", format!("{} 23:59:59", end)]),
            json!(["stop_datetime", ">=", format!("{} 00:00:00", query_start)]),
        ];
        if let Some(id) = employee_id {
            domain.insert(0, json!("&"));
            domain.push(json!(["employee_id", "=", id]));
        }

        let mut kwargs = Map::new();
        kwargs.insert(
            "fields".into(),
            json!(["name", "start_datetime", "stop_datetime", "employee_id"]),
        );

        let result = self
            .odoo
            .execute_kw(
                "hr.leave.report.calendar",
                "search_read",
                vec![Value::Array(domain)],
                kwargs,
            )
            .await?;
        Ok(json!({ "success": true, "result": result }))
    }

    async fn search_partner_by_name(&self, args: Value) -> Result<Value> {
        let name = require_str(&args, "name")?;
        let limit = int_arg(&args, "limit").unwrap_or(10);

        let domain = json!([
            "&",
            ["is_company", "=", true],
            ["name", "ilike", name],
        ]);

        let mut kwargs = Map::new();
        kwargs.insert(
            "fields".into(),
            json!(["name", "email", "mobile", "comment"]),
        );
        if limit >= 1 {
            kwargs.insert("limit".into(), json!(limit));
        }

        let result = self
            .odoo
            .execute_kw("res.partner", "search_read", vec![domain], kwargs)
            .await?;
        let cleaned = clean_records(result, &["name", "email", "mobile", "comment"]);
        Ok(json!({ "success": true, "result": cleaned }))
    }

    async fn create_customer(&self, args: Value) -> Result<Value> {
        let name = require_str(&args, "name")?;
        let is_company = args
            .get("is_company")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        if let Some(email) = opt_str(&args, "email") {
            if !is_valid_email(&email) {
                return Err(anyhow!("Invalid email address: {}", email));
            }
        }

        let mut values = Map::new();
        values.insert("name".into(), json!(name));
        values.insert("is_company".into(), json!(is_company));
        values.insert("customer_rank".into(), json!(1));
        values.insert("supplier_rank".into(), json!(0));
        for field in ["email", "phone", "mobile", "street", "city", "comment"] {
            if let Some(v) = opt_str(&args, field) {
                values.insert(field.into(), json!(v));
            }
        }
        if let Some(country_id) = int_arg(&args, "country_id") {
            values.insert("country_id".into(), json!(country_id));
        }

        let id = self.odoo.create("res.partner", Value::Object(values)).await?;
        Ok(json!({ "success": true, "partner_id": id }))
    }

    async fn create_lead(&self, args: Value) -> Result<Value> {
        let name = require_str(&args, "name")?;
        if name.trim().is_empty() {
            return Err(anyhow!("Opportunity name must not be empty"));
        }
        if let Some(email) = opt_str(&args, "email_from") {
            if !is_valid_email(&email) {
                return Err(anyhow!("Invalid email address: {}", email));
            }
        }

        let probability = args
            .get("probability")
            .and_then(Value::as_f64)
            .unwrap_or(10.0);
        if !(0.0..=100.0).contains(&probability) {
            return Err(anyhow!("probability must be between 0 and 100"));
        }
        if let Some(revenue) = args.get("expected_revenue").and_then(Value::as_f64) {
            if revenue < 0.0 {
                return Err(anyhow!("expected_revenue must be nonnegative"));
            }
        }

        let mut values = Map::new();
        values.insert("name".into(), json!(name));
        values.insert("type".into(), json!("opportunity"));
        values.insert("probability".into(), json!(probability));
        if let Some(revenue) = args.get("expected_revenue").and_then(Value::as_f64) {
            values.insert("expected_revenue".into(), json!(revenue));
        }
        for field in ["contact_name", "email_from", "phone", "company_name", "description"] {
            if let Some(v) = opt_str(&args, field) {
                values.insert(field.into(), json!(v));
            }
        }

        // An existing partner fills in contact details not given explicitly.
        if let Some(partner_id) = int_arg(&args, "partner_id") {
            let records = self
                .odoo
                .read(
                    "res.partner",
                    &[partner_id],
                    &["name", "email", "phone", "mobile", "is_company"],
                )
                .await?;
            let partner = records
                .as_array()
                .and_then(|a| a.first())
                .ok_or_else(|| anyhow!("Partner {} not found", partner_id))?;
            values.insert("partner_id".into(), json!(partner_id));
            for (arg_key, lead_key, partner_key) in [
                ("contact_name", "contact_name", "name"),
                ("email_from", "email_from", "email"),
                ("phone", "phone", "phone"),
            ] {
                if opt_str(&args, arg_key).is_none() {
                    if let Some(v) = partner.get(partner_key).and_then(Value::as_str) {
                        values.insert(lead_key.into(), json!(v));
                    }
                }
            }
            let is_company = partner
                .get("is_company")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if is_company && opt_str(&args, "company_name").is_none() {
                if let Some(v) = partner.get("name").and_then(Value::as_str) {
                    values.insert("partner_name".into(), json!(v));
                }
            }
        }

        let id = self.odoo.create("crm.lead", Value::Object(values)).await?;
        Ok(json!({ "success": true, "lead_id": id }))
    }

    async fn search_calendar_events(&self, args: Value) -> Result<Value> {
        let start_date = require_str(&args, "start_date")?;
        let end_date = opt_str(&args, "end_date").unwrap_or_else(|| start_date.clone());
        let limit = int_arg(&args, "limit").unwrap_or(50);

        parse_date(&start_date, "start_date")?;
        parse_date(&end_date, "end_date")?;

        let partner_id = self.current_partner_id().await?;
        let domain = json!([
            "&",
            "&",
            ["start", ">=", format!("{} 00:00:00", start_date)],
            ["start", "<=", format!("{} 23:59:59", end_date)],
            ["partner_ids", "in", [partner_id]],
        ]);

        let mut kwargs = Map::new();
        kwargs.insert(
            "fields".into(),
            json!([
                "name", "start", "stop", "allday", "description", "location",
                "partner_ids", "opportunity_id",
            ]),
        );
        kwargs.insert("limit".into(), json!(limit));
        kwargs.insert("order".into(), json!("start asc"));

        let result = self
            .odoo
            .execute_kw("calendar.event", "search_read", vec![domain], kwargs)
            .await?;

        let mut events = Vec::new();
        if let Value::Array(records) = result {
            for record in records {
                events.push(self.enrich_calendar_event(record).await);
            }
        }
        let cleaned = clean_records(
            Value::Array(events),
            &["name", "start", "stop", "description", "location"],
        );
        Ok(json!({ "success": true, "result": cleaned }))
    }

    /// Replace a calendar record's raw `partner_ids` with participant names
    /// and flatten `opportunity_id` from its `[id, display_name]` pair.
    /// Enrichment failures degrade to the bare record, never to an error.
    async fn enrich_calendar_event(&self, record: Value) -> Value {
        let Value::Object(mut map) = record else {
            return record;
        };

        let ids: Vec<i64> = map
            .get("partner_ids")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let names: Vec<String> = if ids.is_empty() {
            Vec::new()
        } else {
            match self.odoo.read("res.partner", &ids, &["name"]).await {
                Ok(partners) => partners
                    .as_array()
                    .map(|a| {
                        a.iter()
                            .filter_map(|p| p.get("name").and_then(Value::as_str))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                Err(_) => Vec::new(),
            }
        };
        map.insert(
            "partner_ids".into(),
            if names.is_empty() {
                Value::Null
            } else {
                json!(names)
            },
        );

        let opportunity_id = match map.get("opportunity_id") {
            Some(Value::Array(pair)) => pair.first().and_then(Value::as_i64),
            Some(Value::Number(n)) => n.as_i64(),
            _ => None,
        };
        map.insert("opportunity_id".into(), json!(opportunity_id));

        Value::Object(map)
    }

    async fn create_calendar_event(&self, args: Value) -> Result<Value> {
        let date = require_str(&args, "date")?;
        let name = require_str(&args, "name")?;
        let day = parse_date(&date, "date")?;

        let partner_id = self.current_partner_id().await?;
        let mut participant_ids = vec![partner_id];

        let mut values = Map::new();
        values.insert("name".into(), json!(name));
        for field in ["description", "location"] {
            if let Some(v) = opt_str(&args, field) {
                values.insert(field.into(), json!(v));
            }
        }

        // Linking to an opportunity makes the event jumpable from the CRM
        // and invites the opportunity's customer.
        if let Some(lead_id) = int_arg(&args, "lead_id") {
            let records = self
                .odoo
                .read("crm.lead", &[lead_id], &["name", "partner_id"])
                .await?;
            let lead = records
                .as_array()
                .and_then(|a| a.first())
                .cloned()
                .ok_or_else(|| anyhow!("Opportunity {} not found", lead_id))?;

            values.insert("res_model".into(), json!("crm.lead"));
            values.insert("res_id".into(), json!(lead_id));
            values.insert("opportunity_id".into(), json!(lead_id));

            let lead_partner = lead
                .get("partner_id")
                .and_then(|p| p.as_array())
                .and_then(|p| p.first())
                .and_then(Value::as_i64);
            if let Some(pid) = lead_partner {
                if !participant_ids.contains(&pid) {
                    participant_ids.push(pid);
                }
            }
        }
        values.insert("partner_ids".into(), json!([[6, 0, participant_ids]]));

        match opt_str(&args, "start_time") {
            Some(start_time) => {
                let (start, stop) = timed_event_window(
                    day,
                    &start_time,
                    opt_str(&args, "end_time").as_deref(),
                )?;
                values.insert("allday".into(), json!(false));
                values.insert(
                    "start".into(),
                    json!(start.format("%Y-%m-%d %H:%M:%S").to_string()),
                );
                values.insert(
                    "stop".into(),
                    json!(stop.format("%Y-%m-%d %H:%M:%S").to_string()),
                );
            }
            None => {
                values.insert("allday".into(), json!(true));
                values.insert("start_date".into(), json!(date));
                values.insert("stop_date".into(), json!(date));
            }
        }

        let id = self
            .odoo
            .create("calendar.event", Value::Object(values))
            .await?;
        Ok(json!({ "success": true, "event_id": id }))
    }

    /// Resolve the partner record linked to the authenticated user.
    async fn current_partner_id(&self) -> Result<i64> {
        let records = self
            .odoo
            .read("res.users", &[self.odoo.uid()], &["partner_id"])
            .await?;
        let record = records
            .as_array()
            .and_then(|a| a.first())
            .ok_or_else(|| anyhow!("Current user record not found"))?;
        // partner_id comes back as [id, display_name]
        record
            .get("partner_id")
            .and_then(|p| p.as_array())
            .and_then(|p| p.first())
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("Current user has no linked partner"))
    }
}

fn require_str(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Missing required argument: {}", key))
}

fn opt_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int_arg(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(Value::as_i64)
}

fn parse_date(s: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid {} (expected YYYY-MM-DD): {}", field, s))
}

/// Compute the start/stop datetimes of a timed event. A missing end time
/// means one hour after start, rolling into the next day when the start is
/// late enough; an explicit end must come after the start.
fn timed_event_window(
    day: NaiveDate,
    start_time: &str,
    end_time: Option<&str>,
) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (sh, sm) = parse_time(start_time, "start_time")?;
    let start = day
        .and_hms_opt(sh, sm, 0)
        .ok_or_else(|| anyhow!("Invalid start_time: {}", start_time))?;

    let stop = match end_time {
        Some(end_time) => {
            let (eh, em) = parse_time(end_time, "end_time")?;
            let stop = day
                .and_hms_opt(eh, em, 0)
                .ok_or_else(|| anyhow!("Invalid end_time: {}", end_time))?;
            if stop <= start {
                return Err(anyhow!("end_time must be after start_time"));
            }
            stop
        }
        None => start + Duration::hours(1),
    };
    Ok((start, stop))
}

fn parse_time(s: &str, field: &str) -> Result<(u32, u32)> {
    let parsed = s
        .split_once(':')
        .and_then(|(h, m)| Some((h.parse::<u32>().ok()?, m.parse::<u32>().ok()?)))
        .filter(|&(h, m)| h < 24 && m < 60);
    parsed.ok_or_else(|| anyhow!("Invalid {} (expected HH:MM): {}", field, s))
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .unwrap_or_else(|e| panic!("email pattern: {e}"))
});

fn is_valid_email(email: &str) -> bool {
    // Cheap structural check, the server validates for real.
    EMAIL_RE.is_match(email)
}

/// Odoo returns `false` for empty string fields; map those to null so
/// downstream JSON consumers see a consistent shape. Only the named fields
/// are touched, genuine booleans like `allday` pass through.
fn clean_records(result: Value, string_fields: &[&str]) -> Value {
    match result {
        Value::Array(records) => Value::Array(
            records
                .into_iter()
                .map(|r| match r {
                    Value::Object(map) => Value::Object(
                        map.into_iter()
                            .map(|(k, v)| match v {
                                Value::Bool(false) if string_fields.contains(&k.as_str()) => {
                                    (k, Value::Null)
                                }
                                other => (k, other),
                            })
                            .collect(),
                    ),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn time_parsing() {
        assert_eq!(parse_time("09:30", "t").ok(), Some((9, 30)));
        assert_eq!(parse_time("23:59", "t").ok(), Some((23, 59)));
        assert!(parse_time("24:00", "t").is_err());
        assert!(parse_time("0930", "t").is_err());
    }

    #[test]
    fn empty_string_fields_become_null() {
        let cleaned = clean_records(
            json!([{"name": "Acme", "email": false, "mobile": "555"}]),
            &["name", "email", "mobile"],
        );
        assert_eq!(
            cleaned,
            json!([{"name": "Acme", "email": null, "mobile": "555"}])
        );
    }

    #[test]
    fn boolean_fields_survive_cleaning() {
        let cleaned = clean_records(
            json!([{"name": "standup", "allday": false, "description": false}]),
            &["name", "description"],
        );
        assert_eq!(
            cleaned,
            json!([{"name": "standup", "allday": false, "description": null}])
        );
    }

    #[test]
    fn default_event_end_rolls_into_next_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let (start, stop) = timed_event_window(day, "23:30", None).unwrap();
        assert!(stop > start);
        assert_eq!(stop.format("%Y-%m-%d %H:%M:%S").to_string(), "2026-03-11 00:30:00");
    }

    #[test]
    fn event_end_must_follow_start() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert!(timed_event_window(day, "14:00", Some("13:00")).is_err());
        assert!(timed_event_window(day, "14:00", Some("14:00")).is_err());
        let (start, stop) = timed_event_window(day, "14:00", Some("15:30")).unwrap();
        assert!(stop > start);
    }
}
