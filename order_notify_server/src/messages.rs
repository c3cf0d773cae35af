//! WhatsApp message templates.
//!
//! Pure string interpolation over a [`NotificationRecord`]; the copy is the fixed Spanish text the store
//! runs with. `*…*` is WhatsApp bold markup.

use crate::normalize::NotificationRecord;

/// Order confirmation, sent for every new paid order.
pub fn build_order_message(record: &NotificationRecord, store_name: &str) -> String {
    let products = product_lines(record);
    format!(
        "👋 Hola {name}, gracias por tu compra en *{store_name}*\n\n\
         Este mensaje es para confirmar tu pedido con nosotros y consta de:\n\
         {products} por un valor de: *{total} {currency}*\n\n\
         Tus datos de envío son los siguientes:\n\
         {address}\n\n\
         *¿Nos confirma su pedido?*",
        name = record.customer_name,
        total = record.total,
        currency = record.currency,
        address = record.shipping_address,
    )
}

/// Abandoned-checkout reminder. The address block only appears when the address passed the completeness
/// check; a half-filled checkout usually has a partial address that would read as broken.
pub fn build_abandoned_checkout_message(record: &NotificationRecord, store_name: &str) -> String {
    let products = product_lines(record);
    let address_block = if record.address_complete {
        format!("\n\nTus datos de envío son los siguientes:\n{}", record.shipping_address)
    } else {
        String::new()
    };
    format!(
        "👋 Hola {name}, vimos que dejaste tu compra en *{store_name}* sin terminar.\n\n\
         Tu carrito contiene:\n\
         {products} por un valor de: *{total} {currency}*{address_block}\n\n\
         *¿Te ayudamos a completar tu pedido?*",
        name = record.customer_name,
        total = record.total,
        currency = record.currency,
    )
}

fn product_lines(record: &NotificationRecord) -> String {
    record.products.iter().map(|p| format!("*{} x {}*", p.quantity, p.name)).collect::<Vec<_>>().join("\n")
}
