// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock identity, object storage, email and payment adapters.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pixora_core::types::{AdapterType, AuthUser, EmailMessage, HealthStatus, PaymentOrder};
use pixora_core::{
    EmailSender, IdentityProvider, ObjectStorage, PaymentProvider, PixoraError, PluginAdapter,
};

macro_rules! mock_adapter {
    ($ty:ty, $name:literal, $kind:expr) => {
        #[async_trait]
        impl PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> AdapterType {
                $kind
            }

            async fn health_check(&self) -> Result<HealthStatus, PixoraError> {
                Ok(HealthStatus::Healthy)
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Resolves bearer tokens registered with [`MockIdentity::add_user`].
pub struct MockIdentity {
    users: Arc<Mutex<HashMap<String, AuthUser>>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self {
            users: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn add_user(&self, token: &str, user: AuthUser) {
        self.users.lock().await.insert(token.to_string(), user);
    }
}

mock_adapter!(MockIdentity, "mock-identity", AdapterType::Identity);

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, PixoraError> {
        Ok(self.users.lock().await.get(access_token).cloned())
    }
}

/// An object stored through [`MockObjectStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Issues fake signed URLs and records uploads and removals.
pub struct MockObjectStorage {
    signed: Arc<Mutex<Vec<(String, String)>>>,
    uploads: Arc<Mutex<Vec<Upload>>>,
    removed: Arc<Mutex<Vec<(String, String)>>>,
    fail_sign: AtomicBool,
    fail_upload: AtomicBool,
    fail_remove: AtomicBool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self {
            signed: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            removed: Arc::new(Mutex::new(Vec::new())),
            fail_sign: AtomicBool::new(false),
            fail_upload: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    pub fn fail_sign(&self, fail: bool) {
        self.fail_sign.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// `(bucket, path)` pairs a signed URL was issued for.
    pub async fn signed(&self) -> Vec<(String, String)> {
        self.signed.lock().await.clone()
    }

    pub async fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().await.clone()
    }

    /// `(bucket, path)` pairs removed so far, in call order.
    pub async fn removed(&self) -> Vec<(String, String)> {
        self.removed.lock().await.clone()
    }
}

mock_adapter!(MockObjectStorage, "mock-object-storage", AdapterType::ObjectStorage);

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, PixoraError> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: object not found"));
        }
        self.signed
            .lock()
            .await
            .push((bucket.to_string(), path.to_string()));
        Ok(format!(
            "https://storage.test/{bucket}/{path}?expires={expires_in_secs}&token=signed"
        ))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), PixoraError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: upload rejected"));
        }
        let mut uploads = self.uploads.lock().await;
        if uploads.iter().any(|u| u.bucket == bucket && u.path == path) {
            return Err(PixoraError::provider("mock: object already exists"));
        }
        uploads.push(Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), PixoraError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: storage unavailable"));
        }
        let mut removed = self.removed.lock().await;
        for path in paths {
            removed.push((bucket.to_string(), path.clone()));
        }
        Ok(())
    }
}

/// Captures sent emails.
pub struct MockEmail {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: AtomicBool,
}

impl MockEmail {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

mock_adapter!(MockEmail, "mock-email", AdapterType::Email);

#[async_trait]
impl EmailSender for MockEmail {
    async fn send(&self, message: &EmailMessage) -> Result<String, PixoraError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PixoraError::provider("mock: email rejected"));
        }
        let mut sent = self.sent.lock().await;
        sent.push(message.clone());
        Ok(format!("email-{}", sent.len()))
    }
}

/// Creates orders `ORDER-n` and captures them with a configurable status.
pub struct MockPayment {
    orders: Arc<Mutex<Vec<(String, String, String)>>>,
    captures: Arc<Mutex<Vec<String>>>,
    capture_status: Arc<Mutex<String>>,
    counter: AtomicUsize,
}

impl MockPayment {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(Mutex::new(Vec::new())),
            captures: Arc::new(Mutex::new(Vec::new())),
            capture_status: Arc::new(Mutex::new("COMPLETED".to_string())),
            counter: AtomicUsize::new(0),
        }
    }

    pub async fn set_capture_status(&self, status: &str) {
        *self.capture_status.lock().await = status.to_string();
    }

    /// `(order_id, amount, currency)` of every created order.
    pub async fn orders(&self) -> Vec<(String, String, String)> {
        self.orders.lock().await.clone()
    }

    pub async fn captures(&self) -> Vec<String> {
        self.captures.lock().await.clone()
    }
}

mock_adapter!(MockPayment, "mock-payment", AdapterType::Payment);

#[async_trait]
impl PaymentProvider for MockPayment {
    async fn create_order(&self, amount: &str, currency: &str) -> Result<PaymentOrder, PixoraError> {
        let id = format!("ORDER-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.orders
            .lock()
            .await
            .push((id.clone(), amount.to_string(), currency.to_string()));
        Ok(PaymentOrder {
            id: id.clone(),
            status: "CREATED".to_string(),
            raw: serde_json::json!({ "id": id, "status": "CREATED" }),
        })
    }

    async fn capture_order(&self, order_id: &str) -> Result<PaymentOrder, PixoraError> {
        self.captures.lock().await.push(order_id.to_string());
        let status = self.capture_status.lock().await.clone();
        Ok(PaymentOrder {
            id: order_id.to_string(),
            status: status.clone(),
            raw: serde_json::json!({ "id": order_id, "status": status }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identity_resolves_registered_tokens_only() {
        let identity = MockIdentity::new();
        identity
            .add_user(
                "tok",
                AuthUser {
                    id: "u1".into(),
                    email: "a@b.c".into(),
                    display_name: None,
                },
            )
            .await;
        assert_eq!(identity.get_user("tok").await.unwrap().unwrap().id, "u1");
        assert!(identity.get_user("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn object_storage_records_removals() {
        let storage = MockObjectStorage::new();
        storage
            .remove("TrainingData", &["u1/a.zip".to_string()])
            .await
            .unwrap();
        assert_eq!(
            storage.removed().await,
            vec![("TrainingData".to_string(), "u1/a.zip".to_string())]
        );
        storage.fail_remove(true);
        assert!(storage.remove("TrainingData", &[]).await.is_err());
    }

    #[tokio::test]
    async fn payment_capture_status_is_configurable() {
        let payment = MockPayment::new();
        let order = payment.create_order("10.00", "USD").await.unwrap();
        assert_eq!(order.id, "ORDER-1");
        payment.set_capture_status("DECLINED").await;
        assert_eq!(payment.capture_order("ORDER-1").await.unwrap().status, "DECLINED");
    }
}
