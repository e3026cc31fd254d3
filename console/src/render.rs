use std::fmt::Write;

use common::{QUOTE_SYMBOL, SOURCE_SYMBOL};
use transfer_client::view::{BalanceStyle, ViewState};

fn toggle(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Plain-text rendering of a view snapshot
pub fn render(view: &ViewState) -> String {
    let mut out = String::new();

    let inventory_note = match view.inventory_style {
        BalanceStyle::Normal => "",
        BalanceStyle::Low => " (low)",
        BalanceStyle::Error => " (unavailable)",
    };

    let _ = writeln!(out, "wallet:    {}", view.connect_label);
    let _ = writeln!(
        out,
        "network:   {} [{}, selector {}]",
        view.network_name,
        view.selected_chain,
        toggle(view.chain_selector_enabled)
    );
    let _ = writeln!(out, "gas price: {}", view.gas_price);
    let _ = writeln!(
        out,
        "inventory: {} {SOURCE_SYMBOL}{inventory_note}",
        view.inventory_balance
    );
    let _ = writeln!(
        out,
        "quote:     {} {QUOTE_SYMBOL} [amount {}, transfer {}]",
        view.quoted_amount,
        toggle(view.amount_input_enabled),
        toggle(view.transfer_enabled)
    );

    if let Some(lookup) = &view.lookup {
        let _ = writeln!(out, "lookup:    {} holds {} {SOURCE_SYMBOL}", lookup.address, lookup.balance);
    }
    if let Some(notice) = &view.notification {
        let _ = writeln!(out, "[{}] {}", notice.severity, notice.message);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_view() {
        let out = render(&ViewState::default());
        assert!(out.contains("wallet:    Connect Wallet"));
        assert!(out.contains("network:   Not Connected [arbitrum, selector disabled]"));
        assert!(out.contains("quote:     0 MON [amount disabled, transfer disabled]"));
        assert!(!out.contains("lookup:"));
    }

    #[test]
    fn test_render_low_inventory() {
        let view = ViewState {
            inventory_balance: "0.0000".to_string(),
            inventory_style: BalanceStyle::Low,
            ..ViewState::default()
        };
        assert!(render(&view).contains("inventory: 0.0000 ETH (low)"));
    }
}
