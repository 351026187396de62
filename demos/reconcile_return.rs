//! Reconcile a small purchase return and print the results.

use gst_recon_core::{Bucket, ReconciliationEngine, XlsxRenderer};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .init();

    let request = json!({
        "rtin": "29AAAAA0000A1Z5",
        "processed": [
            {"Sr No": 1, "GSTIN": "29ABCDE1234F1Z5", "Invoice Number": "INV-101", "Supplier Amount": 11800,
             "IGST 18%": 1800, "Taxable Value": 10000, "Action": "Accept"},
            {"Sr No": 2, "GSTIN": "27PQRSX5678L1Z2", "Invoice Number": "FR-88", "Supplier Amount": 1050,
             "CGST 5%": 25, "SGST 5%": 25, "Ledger Name": "Freight Inward [disallow]", "Action": "Reject"}
        ],
        "mismatched": [
            {"GSTIN": "33LMNOP4321K1Z9", "Invoice Number": "MM-7", "Supplier Amount": 2240,
             "Custom IGST": 240, "Accept Credit": "No", "Action": "Pending"}
        ],
        "reverseCharge": [
            {"GSTIN": "07RCMAB1111C1Z3", "Invoice Number": "LEGAL-1", "Supplier Amount": 5000, "IGST 18%": 900}
        ],
        "annexures": [
            {"sheetName": "IMPG", "headers": ["Integrated Tax(Amount of tax)"],
             "rows": [{"Integrated Tax(Amount of tax)": 4500}]}
        ],
        "sourceRows": [
            {"GSTIN of supplier": "29ABCDE1234F1Z5", "Invoice number": "INV-101", "Invoice type": "Regular",
             "Invoice Date": "2025-10-03", "Invoice Value(₹)": 11800, "Place of supply": "Karnataka",
             "Taxable Value (₹)": 10000, "Integrated Tax(₹)": 1800, "GSTR-1/IFF/GSTR-5 Period": "Oct'25"},
            {"GSTIN of supplier": "27PQRSX5678L1Z2", "Invoice number": "FR-88", "Invoice type": "Regular",
             "Invoice Date": "12/10/2025", "Invoice Value(₹)": 1050, "Place of supply": "27-Maharashtra",
             "Taxable Value (₹)": 1000, "Central Tax(₹)": 25, "State/UT Tax(₹)": 25, "GSTR-1/IFF/GSTR-5 Period": "102025"}
        ]
    });

    let engine = ReconciliationEngine::new();
    let output = engine.run_json(request)?;

    for bucket in Bucket::ALL {
        let totals = output.summary.buckets.get(bucket);
        println!("{:<22} rows={} tax={}", bucket.label(), totals.rows, totals.tax.total());
    }
    println!("Net credit (ADD - LESS): {}", output.ledger.grand_total.total);
    println!("RCM payable: {}", output.ledger.rcm_payable);

    let bytes = output.render_workbook(&XlsxRenderer::new())?;
    println!("Workbook: {} sheets, {} bytes", output.workbook.sheets.len(), bytes.len());

    println!("{}", serde_json::to_string_pretty(&output.feed)?);
    Ok(())
}
