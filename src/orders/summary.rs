//! Order summary rendering

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};

use crate::orders::{Order, OrderError, OrderLine};

impl Order<'_> {
    /// Write a table of the order lines followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Io`] if writing to `out` fails.
    pub fn write_summary(&self, mut out: impl io::Write) -> Result<(), OrderError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Variation", "SKU", "Qty", "Unit Price", "Total"]);

        for (index, line) in self.lines.iter().enumerate() {
            builder.push_record(line_cells(index, line));
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(4..7), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| OrderError::Io)?;

        let totals = &self.totals;

        let rows = [
            (" Subtotal:", totals.subtotal.to_string()),
            (" Discount:", format!("-{}", totals.discount)),
            (" Shipping:", totals.shipping.to_string()),
            (" Total:", totals.grand_total.to_string()),
        ];

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in &rows {
            writeln!(out, "{label:<label_width$} {value:>value_width$}")
                .map_err(|_err| OrderError::Io)?;
        }

        writeln!(
            out,
            "\n Order {} is {} ({})\n",
            self.id, self.status, self.checkout.payment_method
        )
        .map_err(|_err| OrderError::Io)
    }
}

fn line_cells(index: usize, line: &OrderLine<'_>) -> [String; 7] {
    [
        format!("#{:<3}", index + 1),
        line.title.clone(),
        line.key
            .as_ref()
            .map(|key| {
                key.iter()
                    .map(|(_, value)| value)
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .unwrap_or_default(),
        line.sku.to_string(),
        line.quantity.to_string(),
        line.unit_price.to_string(),
        line.line_total.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use crate::{
        cart::{Cart, LineItem},
        catalog::Catalog,
        orders::{Address, CheckoutDetails, OrderId, PaymentMethod},
        products::{ProductId, SimpleProduct},
        totals::{DiscountEffect, ShippingPolicy},
    };

    use super::*;

    #[test]
    fn summary_lists_lines_and_totals() -> TestResult {
        let mut catalog = Catalog::new();
        catalog.insert_product(SimpleProduct::new(
            "lamp",
            "Desk Lamp",
            "LMP-1",
            Money::from_minor(2_000, USD),
        )?)?;

        let mut cart = Cart::new(USD);
        cart.add_or_merge(LineItem::resolve(
            &catalog,
            &ProductId::new("lamp"),
            Vec::<(&str, &str)>::new(),
            2,
        )?)?;

        let order = Order::place(
            OrderId::new("order-7"),
            &cart,
            &catalog,
            &DiscountEffect::None,
            &ShippingPolicy::flat(Money::from_minor(500, USD)),
            CheckoutDetails::new(Address::default(), PaymentMethod::Cod),
        )?;

        let mut out = Vec::new();
        order.write_summary(&mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("Desk Lamp"), "missing title: {text}");
        assert!(text.contains("LMP-1"), "missing sku: {text}");
        assert!(text.contains("$45.00"), "missing grand total: {text}");
        assert!(text.contains("order-7 is pending-payment (cod)"), "missing status: {text}");

        Ok(())
    }
}
