// src/services/mirror.rs

//! Espelho ao vivo de uma coleção remota.
//!
//! Uma `Subscription` entrega o snapshot completo da consulta sempre que a
//! coleção muda. O snapshot substitui o estado local inteiro; não há merge.

use futures::{stream, Stream};
use serde::de::DeserializeOwned;
use tokio::{
    sync::{broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};

use crate::{
    common::error::AppError,
    db::store::{Document, Query, SharedStore},
    models::{
        application::PartnerApplication, appointment::Appointment, coupon::SurveyCoupon,
        product::Product, ticket::Ticket,
    },
};

pub type Snapshot<T> = Result<Vec<T>, AppError>;

/// Handle de uma assinatura. Soltar o handle encerra a tarefa de escuta.
pub struct Subscription<T> {
    receiver: mpsc::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Próximo snapshot. `None` depois de um erro ou do fim do store.
    pub async fn next(&mut self) -> Option<Snapshot<T>> {
        self.receiver.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> + Send {
        stream::unfold(self, |mut sub| async move {
            sub.next().await.map(|snapshot| (snapshot, sub))
        })
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Documentos que não decodificam são pulados com aviso.
pub fn decode_snapshot<T: DeserializeOwned>(collection: &str, docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("⚠️ Documento {}/{} ignorado no espelho: {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}

pub async fn fetch_snapshot<T: DeserializeOwned>(store: &SharedStore, query: &Query) -> Snapshot<T> {
    let docs = store.query(query).await?;
    Ok(decode_snapshot(&query.collection, &docs))
}

pub fn subscribe<T>(store: SharedStore, query: Query) -> Subscription<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(8);

    let task = tokio::spawn(async move {
        // Inscreve antes do primeiro snapshot para não perder mudanças.
        let mut changes = store.changes();

        loop {
            match fetch_snapshot::<T>(&store, &query).await {
                Ok(items) => {
                    if sender.send(Ok(items)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Espelho de '{}' interrompido: {}", query.collection, e);
                    let _ = sender.send(Err(e)).await;
                    return;
                }
            }

            loop {
                match changes.recv().await {
                    Ok(event) if event.collection == query.collection => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Espelho de '{}' atrasou {} eventos", query.collection, skipped);
                        break;
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    });

    Subscription { receiver, task }
}

// =============================================================================
//  ESTADO LOCAL: otimista + reconciliação
// =============================================================================

pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed_by_id {
    ($($ty:ty),+) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })+
    };
}

keyed_by_id!(Ticket, PartnerApplication, Appointment, SurveyCoupon, Product);

pub enum MirrorCommand<T> {
    Remove(Vec<String>),
    Upsert(T),
    Patch(String, Box<dyn FnOnce(&mut T) + Send>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirrorState<T> {
    pub items: Vec<T>,
}

impl<T> Default for MirrorState<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> MirrorState<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// O snapshot do servidor sempre vence: substitui tudo.
    pub fn reconcile(self, snapshot: Vec<T>) -> Self {
        Self { items: snapshot }
    }

    pub fn apply_optimistic(mut self, command: MirrorCommand<T>) -> Self {
        match command {
            MirrorCommand::Remove(ids) => {
                self.items.retain(|item| !ids.iter().any(|id| id == item.key()));
            }
            MirrorCommand::Upsert(item) => {
                match self.items.iter_mut().find(|existing| existing.key() == item.key()) {
                    Some(existing) => *existing = item,
                    None => self.items.push(item),
                }
            }
            MirrorCommand::Patch(id, patch) => {
                if let Some(existing) = self.items.iter_mut().find(|existing| existing.key() == id) {
                    patch(existing);
                }
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
