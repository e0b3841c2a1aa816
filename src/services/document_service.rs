// src/services/document_service.rs

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use genpdf::{elements, style, Element};

use crate::{
    common::{error::AppError, i18n::I18nStore},
    models::{
        finance::{Payment, RevenueSummary},
        partner::Partner,
    },
};

const FONT_FAMILY: &str = "Roboto";

// Uma linha da tabela do extrato, já formatada.
#[derive(Debug, Clone, PartialEq)]
struct StatementRow {
    date: String,
    description: String,
    amount: String,
}

fn statement_rows(payments: &[Payment]) -> Vec<StatementRow> {
    payments
        .iter()
        .map(|p| StatementRow {
            date: p.paid_at.format("%d/%m/%Y").to_string(),
            description: if p.description.is_empty() { "-".to_string() } else { p.description.clone() },
            amount: format!("{:.2}", p.amount),
        })
        .collect()
}

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: PathBuf,
    i18n: Arc<I18nStore>,
}

impl DocumentService {
    pub fn new(fonts_dir: impl Into<PathBuf>, i18n: Arc<I18nStore>) -> Self {
        Self { fonts_dir: fonts_dir.into(), i18n }
    }

    /// Extrato de receitas de um parceiro em PDF, renderizado em memória.
    pub fn revenue_statement_pdf(
        &self,
        partner: &Partner,
        payments: &[Payment],
        summary: &RevenueSummary,
        issued_at: DateTime<Utc>,
        lang: &str,
    ) -> Result<Vec<u8>, AppError> {
        let t = |key: &str| self.i18n.translate(lang, &format!("pdf.statement.{}", key));

        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte {} não encontrada em {}", FONT_FAMILY, self.fonts_dir.display()))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("{} - {}", t("title"), partner.name));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(elements::Paragraph::new(t("title")).styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Paragraph::new(format!("{}: {}", t("partner"), partner.name)));
        if !partner.address.is_empty() {
            doc.push(elements::Paragraph::new(partner.address.clone()).styled(style::Style::new().with_font_size(10)));
        }
        doc.push(elements::Paragraph::new(format!("{}: {}", t("issued"), issued_at.format("%d/%m/%Y"))));
        doc.push(elements::Break::new(2));

        // --- LANÇAMENTOS ---
        let rows = statement_rows(payments);
        if rows.is_empty() {
            doc.push(elements::Paragraph::new(t("empty")).styled(style::Style::new().italic()));
        } else {
            let mut table = elements::TableLayout::new(vec![2, 5, 2]);
            table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

            let bold = style::Style::new().bold();
            table
                .row()
                .element(elements::Paragraph::new(t("date")).styled(bold))
                .element(elements::Paragraph::new(t("description")).styled(bold))
                .element(elements::Paragraph::new(t("amount")).styled(bold))
                .push()
                .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

            for row in rows {
                table
                    .row()
                    .element(elements::Paragraph::new(row.date))
                    .element(elements::Paragraph::new(row.description))
                    .element(elements::Paragraph::new(row.amount))
                    .push()
                    .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
            }
            doc.push(table);
        }

        doc.push(elements::Break::new(2));

        // --- TOTAL ---
        let mut total = elements::Paragraph::new(format!("{}: {:.2}", t("total"), summary.total));
        total.set_alignment(genpdf::Alignment::Right);
        doc.push(total.styled(style::Style::new().bold().with_font_size(12)));

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        tracing::debug!("📄 Extrato de {} gerado ({} bytes)", partner.id, buffer.len());
        Ok(buffer)
    }
}
