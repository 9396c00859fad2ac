//! MCP Tool Definitions
//!
//! Defines all available tools for the Odoo MCP server.

use super::protocol::Tool;
use serde_json::json;

/// Get all available MCP tools
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "execute_method".into(),
            description: "Execute an arbitrary method on an Odoo model. Search domains in args are normalized automatically.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "model": {
                        "type": "string",
                        "description": "Model name (e.g., 'res.partner')"
                    },
                    "method": {
                        "type": "string",
                        "description": "Method name to execute (e.g., 'search_read', 'create')"
                    },
                    "args": {
                        "type": "array",
                        "description": "Positional arguments. For search methods the first element is the search domain."
                    },
                    "kwargs": {
                        "type": "object",
                        "description": "Keyword arguments (e.g., fields, limit, order)"
                    }
                },
                "required": ["model", "method"]
            }),
        },
        Tool {
            name: "search_employee".into(),
            description: "Search for employees by name.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name (or part of the name) to search for"
                    },
                    "limit": {
                        "type": "integer",
                        "default": 20,
                        "description": "Max results to return"
                    }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "search_holidays".into(),
            description: "Search for holidays within a date range.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format"
                    },
                    "employee_id": {
                        "type": "integer",
                        "description": "Optional employee ID to filter holidays"
                    }
                },
                "required": ["start_date", "end_date"]
            }),
        },
        Tool {
            name: "search_partner_by_name".into(),
            description: "Search company partners (is_company=true) by name, case-insensitive.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Partner name (or part of it) to search for"
                    },
                    "limit": {
                        "type": "integer",
                        "default": 10,
                        "description": "Max results to return; below 1 means unlimited"
                    }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "create_customer".into(),
            description: "Create a new customer (individual or company).".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Customer name"
                    },
                    "is_company": {
                        "type": "boolean",
                        "default": true,
                        "description": "Whether the customer is a company"
                    },
                    "email": { "type": "string" },
                    "phone": { "type": "string" },
                    "mobile": { "type": "string" },
                    "street": { "type": "string" },
                    "city": { "type": "string" },
                    "country_id": {
                        "type": "integer",
                        "description": "Country ID"
                    },
                    "comment": {
                        "type": "string",
                        "description": "Internal note"
                    }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "create_lead".into(),
            description: "Create a new sales opportunity, optionally based on an existing partner.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Opportunity name"
                    },
                    "partner_id": {
                        "type": "integer",
                        "description": "Existing partner ID to base the lead on"
                    },
                    "contact_name": { "type": "string" },
                    "email_from": { "type": "string" },
                    "phone": { "type": "string" },
                    "company_name": { "type": "string" },
                    "expected_revenue": {
                        "type": "number",
                        "description": "Expected revenue, nonnegative"
                    },
                    "probability": {
                        "type": "number",
                        "default": 10.0,
                        "description": "Success probability, 0-100"
                    },
                    "description": { "type": "string" }
                },
                "required": ["name"]
            }),
        },
        Tool {
            name: "search_calendar_events".into(),
            description: "Search the current user's calendar events within a date range, with participant names and linked opportunities.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "start_date": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End date in YYYY-MM-DD format (defaults to start_date)"
                    },
                    "limit": {
                        "type": "integer",
                        "default": 50,
                        "description": "Max results to return"
                    }
                },
                "required": ["start_date"]
            }),
        },
        Tool {
            name: "create_calendar_event".into(),
            description: "Create a calendar event for the current user; all-day unless times are given.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "date": {
                        "type": "string",
                        "description": "Event date in YYYY-MM-DD format"
                    },
                    "name": {
                        "type": "string",
                        "description": "Event title"
                    },
                    "start_time": {
                        "type": "string",
                        "description": "Start time HH:MM (e.g., 09:30)"
                    },
                    "end_time": {
                        "type": "string",
                        "description": "End time HH:MM; defaults to one hour after start"
                    },
                    "lead_id": {
                        "type": "integer",
                        "description": "Opportunity ID to link the event to; its customer is invited"
                    },
                    "description": { "type": "string" },
                    "location": { "type": "string" }
                },
                "required": ["date", "name"]
            }),
        },
    ]
}
