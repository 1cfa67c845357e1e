use crate::cache::error::CacheError;
use crate::memcache::store;
use crate::protocol::ascii::decoder::AsciiRequest;
use crate::protocol::ascii::encoder::{storage_error_to_response, AsciiResponse};
use crate::protocol::ascii::network::{
    CasRequest, DeleteRequest, DeltaRequest, GetAndTouchRequest, RetrievalResponse,
    StorageRequest, TouchRequest, ValueResponse,
};
use crate::version;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// `ERROR` and `SERVER_ERROR` are sent even when noreply was requested
fn into_noreply(response: AsciiResponse, noreply: bool) -> Option<AsciiResponse> {
    match response {
        AsciiResponse::Error | AsciiResponse::ServerError(_) => Some(response),
        _ if noreply => None,
        _ => Some(response),
    }
}

/// Precondition failures of add, replace, append and prepend are all
/// reported the same way.
fn into_not_stored(err: CacheError) -> AsciiResponse {
    match err {
        CacheError::KeyExists | CacheError::NotFound => AsciiResponse::NotStored,
        err => storage_error_to_response(err),
    }
}

fn into_value_response(key: Bytes, record: store::Record) -> ValueResponse {
    ValueResponse {
        key,
        flags: record.header.flags,
        cas: record.header.cas,
        value: record.value,
    }
}

pub struct AsciiHandler {
    storage: Arc<store::MemcStore>,
}

impl AsciiHandler {
    pub fn new(store: Arc<store::MemcStore>) -> AsciiHandler {
        AsciiHandler { storage: store }
    }

    /// Executes a request, `None` means nothing is sent back
    pub fn handle_request(&self, req: AsciiRequest) -> Option<AsciiResponse> {
        match req {
            AsciiRequest::Set(request) => {
                let noreply = request.noreply;
                into_noreply(self.set(request), noreply)
            }
            AsciiRequest::Add(request) => {
                let noreply = request.noreply;
                into_noreply(self.add_replace(request, true), noreply)
            }
            AsciiRequest::Replace(request) => {
                let noreply = request.noreply;
                into_noreply(self.add_replace(request, false), noreply)
            }
            AsciiRequest::Append(request) => {
                let noreply = request.noreply;
                into_noreply(self.append_prepend(request, true), noreply)
            }
            AsciiRequest::Prepend(request) => {
                let noreply = request.noreply;
                into_noreply(self.append_prepend(request, false), noreply)
            }
            AsciiRequest::Cas(request) => {
                let noreply = request.noreply;
                into_noreply(self.compare_and_swap(request), noreply)
            }
            AsciiRequest::Get(request) => Some(self.get(request.keys, false)),
            AsciiRequest::Gets(request) => Some(self.get(request.keys, true)),
            AsciiRequest::Gat(request) => Some(self.get_and_touch(request, false)),
            AsciiRequest::Gats(request) => Some(self.get_and_touch(request, true)),
            AsciiRequest::Delete(request) => {
                let noreply = request.noreply;
                into_noreply(self.delete(request), noreply)
            }
            AsciiRequest::Touch(request) => {
                let noreply = request.noreply;
                into_noreply(self.touch(request), noreply)
            }
            AsciiRequest::Increment(request) => {
                let noreply = request.noreply;
                into_noreply(self.increment(request), noreply)
            }
            AsciiRequest::Decrement(request) => {
                let noreply = request.noreply;
                into_noreply(self.decrement(request), noreply)
            }
            AsciiRequest::Version => Some(AsciiResponse::Version(version::BLOATCACHE_VERSION)),
            AsciiRequest::Invalid => Some(AsciiResponse::Error),
            AsciiRequest::ItemTooLarge(request) => {
                debug!(
                    "Rejected {} byte value for key {:?}",
                    request.bytes, request.key
                );
                Some(storage_error_to_response(CacheError::ValueTooLarge))
            }
        }
    }

    fn set(&self, request: StorageRequest) -> AsciiResponse {
        let record = store::Record::new(request.value, 0, request.flags, request.exptime);
        match self.storage.set(request.key, record) {
            Ok(_status) => AsciiResponse::Stored,
            Err(err) => storage_error_to_response(err),
        }
    }

    fn add_replace(&self, request: StorageRequest, is_add: bool) -> AsciiResponse {
        let record = store::Record::new(request.value, 0, request.flags, request.exptime);
        let result = if is_add {
            self.storage.add(request.key, record)
        } else {
            self.storage.replace(request.key, record)
        };

        match result {
            Ok(_status) => AsciiResponse::Stored,
            Err(err) => into_not_stored(err),
        }
    }

    fn append_prepend(&self, request: StorageRequest, is_append: bool) -> AsciiResponse {
        // flags and exptime of the stored record are kept
        let record = store::Record::new(request.value, 0, 0, 0);
        let result = if is_append {
            self.storage.append(request.key, record)
        } else {
            self.storage.prepend(request.key, record)
        };

        match result {
            Ok(_status) => AsciiResponse::Stored,
            Err(err) => into_not_stored(err),
        }
    }

    fn compare_and_swap(&self, request: CasRequest) -> AsciiResponse {
        let record = store::Record::new(request.value, 0, request.flags, request.exptime);
        match self
            .storage
            .compare_and_swap(request.key, record, request.cas)
        {
            Ok(_status) => AsciiResponse::Stored,
            Err(err) => storage_error_to_response(err),
        }
    }

    fn get(&self, keys: Vec<Bytes>, with_cas: bool) -> AsciiResponse {
        let values = self
            .storage
            .get_many(keys)
            .into_iter()
            .map(|(key, record)| into_value_response(key, record))
            .collect();
        AsciiResponse::Values(RetrievalResponse { values, with_cas })
    }

    fn get_and_touch(&self, request: GetAndTouchRequest, with_cas: bool) -> AsciiResponse {
        let values = self
            .storage
            .get_and_touch_many(request.keys, request.exptime)
            .into_iter()
            .map(|(key, record)| into_value_response(key, record))
            .collect();
        AsciiResponse::Values(RetrievalResponse { values, with_cas })
    }

    fn delete(&self, request: DeleteRequest) -> AsciiResponse {
        match self.storage.delete(request.key) {
            Ok(_record) => AsciiResponse::Deleted,
            Err(err) => storage_error_to_response(err),
        }
    }

    fn touch(&self, request: TouchRequest) -> AsciiResponse {
        match self.storage.touch(request.key, request.exptime) {
            Ok(()) => AsciiResponse::Touched,
            Err(err) => storage_error_to_response(err),
        }
    }

    fn increment(&self, request: DeltaRequest) -> AsciiResponse {
        let delta = store::IncrementParam {
            delta: request.delta,
        };
        match self.storage.increment(request.key, delta) {
            Ok(delta_result) => AsciiResponse::Number(delta_result.value),
            Err(err) => storage_error_to_response(err),
        }
    }

    fn decrement(&self, request: DeltaRequest) -> AsciiResponse {
        let delta = store::DecrementParam {
            delta: request.delta,
        };
        match self.storage.decrement(request.key, delta) {
            Ok(delta_result) => AsciiResponse::Number(delta_result.value),
            Err(err) => storage_error_to_response(err),
        }
    }
}
