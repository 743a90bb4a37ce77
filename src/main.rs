//! # pageflow CLI
//!
//! Usage:
//!   pageflow input.json -o report.pdf
//!   echo '{ ... }' | pageflow -o report.pdf
//!   pageflow --example > quarterly.json
//!
//! Generation runs on a worker thread; the main thread drains the progress
//! channel so long reports show signs of life on stderr.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use pageflow::chart::RasterChartRenderer;
use pageflow::model::ReportSpec;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    let input = if args.len() > 1 && !args[1].starts_with('-') {
        fs::read_to_string(&args[1]).expect("Failed to read input file")
    } else {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .expect("Failed to read stdin");
        buf
    };

    let output_path = PathBuf::from(
        args.windows(2)
            .find(|w| w[0] == "-o")
            .map(|w| w[1].clone())
            .unwrap_or_else(|| "report.pdf".to_string()),
    );

    let spec: ReportSpec = match serde_json::from_str(&input) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("✗ Failed to parse report spec: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, rx) = mpsc::channel();
    let worker_path = output_path.clone();
    let worker = thread::spawn(move || {
        pageflow::render_spec_with_progress(&spec, &RasterChartRenderer::new(), &worker_path, tx)
    });

    for message in rx {
        eprintln!("  … {}", message);
    }

    match worker.join().expect("report worker panicked") {
        Ok(placements) => {
            let pages = placements.iter().map(|p| p.page).max().unwrap_or(0);
            eprintln!(
                "✓ {} elements across {} pages → {}",
                placements.len(),
                pages,
                output_path.display()
            );
        }
        Err(e) => {
            eprintln!("✗ Report generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn example_report_json() -> &'static str {
    r##"{
  "metadata": {
    "title": "Quarterly Activity Report",
    "author": "pageflow"
  },
  "cover": {
    "title": "Quarterly Activity Report",
    "subtitle": "Q2 2026"
  },
  "sections": [
    {
      "title": "Client Accounts",
      "elements": [
        {
          "type": "bar",
          "title": "Accounts by Subscription Tier",
          "bars": [
            { "label": "Starter", "value": 48 },
            { "label": "Team", "value": 31 },
            { "label": "Business", "value": 17 },
            { "label": "Enterprise", "value": 6 }
          ]
        },
        {
          "type": "pie",
          "title": "Active Revenue by Account Band",
          "slices": [
            { "label": "< 5k", "value": 86000 },
            { "label": "5k - 15k", "value": 342000 },
            { "label": "15k - 50k", "value": 518000 },
            { "label": ">= 50k", "value": 290000 }
          ]
        },
        {
          "type": "pie",
          "title": "Accounts by Company Size",
          "slices": [
            { "label": "1-9", "value": 37 },
            { "label": "10-49", "value": 41 },
            { "label": "50-249", "value": 19 },
            { "label": "250+", "value": 5 }
          ]
        },
        {
          "type": "bar",
          "title": "Accounts by Industry (Top 5)",
          "bars": [
            { "label": "Tech", "value": 29 },
            { "label": "Health", "value": 21 },
            { "label": "Finance", "value": 18 },
            { "label": "Retail", "value": 12 },
            { "label": "Media", "value": 9 }
          ]
        },
        {
          "type": "text",
          "title": "Top 5 Accounts by Amount Paid",
          "fullWidth": true,
          "lines": [
            "Based on total invoiced and paid amounts:",
            "- Northwind Traders - 412 k",
            "- Fabrikam Industries - 268 k",
            "- Contoso Group - 201 k",
            "- Adventure Works - 188 k",
            "- Proseware Labs - 154 k"
          ]
        }
      ]
    },
    {
      "title": "Events",
      "elements": [
        {
          "type": "pie",
          "title": "Events by Category",
          "slices": [
            { "label": "Workshop", "value": 42 },
            { "label": "Webinar", "value": 35 },
            { "label": "Conference", "value": 11 },
            { "label": "Meetup", "value": 27 }
          ]
        },
        {
          "type": "trend",
          "title": "Events per Month",
          "points": [
            { "label": "2026-01", "value": 14 },
            { "label": "2026-02", "value": 18 },
            { "label": "2026-03", "value": 22 },
            { "label": "2026-04", "value": 19 },
            { "label": "2026-05", "value": 27 },
            { "label": "2026-06", "value": 31 }
          ]
        },
        {
          "type": "bar",
          "title": "Events by Seating Capacity",
          "bars": [
            { "label": "< 50", "value": 38 },
            { "label": "50 - 100", "value": 41 },
            { "label": "100 - 200", "value": 24 },
            { "label": ">= 200", "value": 12 }
          ]
        },
        {
          "type": "pie",
          "title": "Event Status",
          "slices": [
            { "label": "Active", "value": 96 },
            { "label": "Archived", "value": 19 }
          ]
        },
        {
          "type": "text",
          "title": "Top 5 Events by Bookings",
          "fullWidth": true,
          "lines": [
            "Based on confirmed bookings:",
            "- Spring Product Summit - 214 bookings",
            "- Remote Work Masterclass - 187 bookings",
            "- Security Deep Dive - 164 bookings",
            "- Design Systems Workshop - 151 bookings",
            "- Quarterly Town Hall - 139 bookings"
          ]
        }
      ]
    },
    {
      "title": "Services",
      "elements": [
        {
          "type": "pie",
          "title": "Services by Type",
          "slices": [
            { "label": "Medical", "value": 58 },
            { "label": "Non-medical", "value": 74 }
          ]
        },
        {
          "type": "bar",
          "title": "Services by Cost Band",
          "bars": [
            { "label": "< 50", "value": 44 },
            { "label": "50 - 100", "value": 39 },
            { "label": "100 - 250", "value": 31 },
            { "label": ">= 250", "value": 18 }
          ]
        },
        {
          "type": "bar",
          "title": "Top 5 Providers by Service Count",
          "bars": [
            { "label": "CareFirst", "value": 27 },
            { "label": "MedPlus", "value": 22 },
            { "label": "WellCo", "value": 19 },
            { "label": "VitaLab", "value": 15 },
            { "label": "Zenith", "value": 11 }
          ]
        },
        {
          "type": "pie",
          "title": "Service Availability",
          "slices": [
            { "label": "Available", "value": 103 },
            { "label": "Suspended", "value": 29 }
          ]
        }
      ]
    }
  ]
}"##
}
