//! End-to-end pipeline tests: parse -> deltas -> persist -> interpret

use chain_pulse::delta::compute_deltas;
use chain_pulse::signal::{AlertKind, Interpreter, Metric};
use chain_pulse::source::parse_chain;
use chain_pulse::store::SnapshotStore;
use tempfile::TempDir;

fn chain_body(ce_buy: i64, ce_oi: i64, pe_sell: i64, pe_oi: i64) -> String {
    format!(
        r#"{{
            "records": {{
                "expiryDates": ["28-Aug-2026", "04-Sep-2026"],
                "data": [
                    {{
                        "expiryDate": "28-Aug-2026",
                        "CE": {{
                            "strikePrice": 48000,
                            "openInterest": 1200,
                            "changeinOpenInterest": {ce_oi},
                            "totalBuyQuantity": {ce_buy},
                            "totalSellQuantity": 10000
                        }},
                        "PE": {{
                            "strikePrice": 48000,
                            "openInterest": 900,
                            "changeinOpenInterest": {pe_oi},
                            "totalBuyQuantity": 5000,
                            "totalSellQuantity": {pe_sell}
                        }}
                    }},
                    {{
                        "expiryDate": "04-Sep-2026",
                        "CE": {{"strikePrice": 48000, "totalBuyQuantity": 1, "totalSellQuantity": 1}}
                    }}
                ]
            }}
        }}"#
    )
}

#[test]
fn two_cycle_flow_raises_single_metric_alert() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("prev_data.json"));
    let interpreter = Interpreter::default();

    // Cycle 1: no baseline, zero deltas, no alert
    let first = parse_chain(&chain_body(100_000, 500, 20_000, 100)).unwrap();
    let deltas = compute_deltas(&first, None);
    store.save(&deltas).unwrap();
    assert!(interpreter.evaluate(&deltas).is_empty());

    // Cycle 2: CE buy quantity jumps by 150,000 with positive OI change
    let second = parse_chain(&chain_body(250_000, 500, 20_000, 100)).unwrap();
    let baseline = store.load().unwrap();
    let deltas = compute_deltas(&second, baseline.as_ref());
    store.save(&deltas).unwrap();

    let alerts = interpreter.evaluate(&deltas);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::SingleMetric(Metric::CeBuy));
    assert_eq!(
        alerts[0].message,
        "Max CE Buy: 150,000 | Change in OI: 500 | Bullish (fresh long build-up)"
    );
}

#[test]
fn combo_takes_precedence_over_single_metric() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("prev_data.json"));
    let interpreter = Interpreter::default();

    let first = parse_chain(&chain_body(100_000, 500, 20_000, 300)).unwrap();
    store.save(&compute_deltas(&first, None)).unwrap();

    // CE buy delta 120k with CE OI > 0, PE sell delta 110k with PE OI > 0
    let second = parse_chain(&chain_body(220_000, 500, 130_000, 300)).unwrap();
    let baseline = store.load().unwrap();
    let alerts = interpreter.evaluate(&compute_deltas(&second, baseline.as_ref()));

    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::ComboCeBuyPeSell);
}

#[test]
fn invalidated_baseline_suppresses_spurious_deltas() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("prev_data.json"));
    let interpreter = Interpreter::default();

    let first = parse_chain(&chain_body(100_000, 500, 20_000, 100)).unwrap();
    store.save(&compute_deltas(&first, None)).unwrap();

    // The burst that produced this snapshot saw retries, so the caller must
    // ignore the stored baseline even though one exists
    let second = parse_chain(&chain_body(900_000, 500, 20_000, 100)).unwrap();
    let deltas = compute_deltas(&second, None);
    assert!(interpreter.evaluate(&deltas).is_empty());

    // The zero-delta snapshot still becomes the next baseline
    store.save(&deltas).unwrap();
    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.ce[0].row.total_buy_quantity, 900_000);
    assert_eq!(stored.ce[0].buy_change, 0);
}
