use crate::config::EmailConfig;
use crate::entities::{order, order_item};
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),
}

/// Sends the store a confirmation email when an order is paid.
///
/// Strictly fire-and-forget: callers log failures and move on. A lost email
/// must never roll back payment recognition.
pub struct NotificationService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_email: String,
    recipient: String,
}

impl NotificationService {
    /// Builds the service from optional SMTP settings. Without settings the
    /// service logs order summaries instead of sending mail.
    pub fn from_config(email: Option<&EmailConfig>) -> Result<Self, NotificationError> {
        match email {
            Some(cfg) => {
                let credentials =
                    Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
                let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
                    .port(cfg.smtp_port)
                    .credentials(credentials)
                    .build();
                Ok(Self {
                    mailer: Some(mailer),
                    from_email: cfg.from_email.clone(),
                    recipient: cfg.order_notification_email.clone(),
                })
            }
            None => Ok(Self {
                mailer: None,
                from_email: String::new(),
                recipient: String::new(),
            }),
        }
    }

    /// Disabled service used where notifications are irrelevant (tests).
    pub fn disabled() -> Self {
        Self {
            mailer: None,
            from_email: String::new(),
            recipient: String::new(),
        }
    }

    #[instrument(skip_all, fields(order_id = %order.id))]
    pub async fn send_order_confirmation(
        &self,
        order: &order::Model,
        items: &[order_item::Model],
        total: Decimal,
    ) -> Result<(), NotificationError> {
        let subject = format!("New Order {}", order.id);
        let body = render_order_summary(order, items, total);

        let Some(mailer) = &self.mailer else {
            info!("Email disabled; order notification:\n{}", body);
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from_email.parse()?)
            .to(self.recipient.parse()?)
            .subject(subject)
            .body(body)?;

        mailer.send(message).await?;
        info!("Order notification email sent");
        Ok(())
    }
}

/// Plaintext order summary for the store owner.
fn render_order_summary(
    order: &order::Model,
    items: &[order_item::Model],
    total: Decimal,
) -> String {
    let mut blocks = Vec::with_capacity(items.len());
    for item in items {
        let custom = item
            .customization
            .as_deref()
            .map(|name| format!(" (Custom Name: {})", name))
            .unwrap_or_default();

        blocks.push(format!(
            "  - {} - {}\n    Category: {}\n    Size: {}\n    Quantity: {}\n    Price: ${} each{}",
            item.product_name,
            item.color_name.as_deref().unwrap_or("N/A"),
            item.category_name.as_deref().unwrap_or("N/A"),
            size_label(&item.size),
            item.quantity,
            item.unit_price,
            custom,
        ));
    }

    let items_summary = if blocks.is_empty() {
        "No items".to_string()
    } else {
        blocks.join("\n\n")
    };

    format!(
        "A new order has been received and paid!\n\n\
         Order ID: {}\n\
         Customer Name: {}\n\
         Email: {}\n\
         Order Date: {}\n\n\
         Order Items:\n{}\n\n\
         Total: ${}\n",
        order.id,
        order.customer_name,
        order.customer_email,
        order.created_at.format("%B %d, %Y at %I:%M %p"),
        items_summary,
        total,
    )
}

/// Human-readable label for a size code; unknown codes pass through.
fn size_label(code: &str) -> &str {
    match code {
        "XS" => "Youth XS",
        "YS" => "Youth Small",
        "YM" => "Youth Medium",
        "YL" => "Youth Large",
        "YXL" => "Youth XL",
        "AS" => "Adult Small",
        "AM" => "Adult Medium",
        "AL" => "Adult Large",
        "AXL" => "Adult XL",
        "2X" => "Adult 2X",
        "3X" => "Adult 3X",
        "4X" => "Adult 4X",
        "5X" => "Adult 5X",
        other => other,
    }
}
