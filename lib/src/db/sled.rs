use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::Result;

use super::{decode, encode, Collectable, Identifiable};

#[derive(Clone, Debug)]
pub struct SledDb {
    inner: sled::Db,
}

impl SledDb {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let inner = sled::Config::default().path(path).open()?;
        Ok(Self { inner })
    }

    /// Opens a database that is removed from disk once dropped.
    pub fn temporary() -> Result<Self> {
        let inner = sled::Config::default().temporary(true).open()?;
        Ok(Self { inner })
    }

    pub fn get_collection<T: DeserializeOwned + Collectable>(&self) -> Result<Vec<T>> {
        self.get_collection_at(T::get_collection_name())
    }

    /// Gets a collection of entries of the same type from the collection
    /// specified by name. Entries come back in key order.
    pub fn get_collection_at<T: DeserializeOwned>(&self, name: impl AsRef<[u8]>) -> Result<Vec<T>> {
        let tree = self.inner.open_tree(name)?;
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value_bytes) = entry?;
            out.push(decode(&value_bytes)?);
        }
        Ok(out)
    }

    /// Gets an item stored under an arbitrary key, e.g. a username.
    pub fn get_raw_at<T: DeserializeOwned>(
        &self,
        collection: impl AsRef<[u8]>,
        key: impl AsRef<[u8]>,
    ) -> Result<Option<T>> {
        let tree = self.inner.open_tree(collection)?;
        match tree.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize + Identifiable + Collectable>(&self, value: &T) -> Result<()> {
        self.set_raw_at(T::get_collection_name(), value, value.get_id())
    }

    pub fn set_raw_at<T: Serialize>(
        &self,
        collection: impl AsRef<[u8]>,
        value: &T,
        id: Uuid,
    ) -> Result<()> {
        let tree = self.inner.open_tree(collection)?;
        tree.insert(id.as_bytes(), encode(value)?)?;
        Ok(())
    }

    /// Stores the value only if nothing is stored under the key yet. The
    /// check and the write happen atomically. Returns whether the value was
    /// written.
    pub fn insert_if_absent<T: Serialize>(
        &self,
        collection: impl AsRef<[u8]>,
        key: impl AsRef<[u8]>,
        value: &T,
    ) -> Result<bool> {
        let tree = self.inner.open_tree(collection)?;
        let swapped = tree.compare_and_swap(key, None as Option<&[u8]>, Some(encode(value)?))?;
        Ok(swapped.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
    struct Note {
        id: Uuid,
        text: String,
    }

    impl Collectable for Note {
        fn get_collection_name() -> &'static str {
            "notes"
        }
    }

    impl Identifiable for Note {
        fn get_id(&self) -> Uuid {
            self.id
        }
    }

    #[test]
    fn set_overwrites_by_id() {
        let db = SledDb::temporary().unwrap();
        let mut note = Note {
            id: Uuid::new_v4(),
            text: "hello".to_string(),
        };
        db.set(&note).unwrap();
        assert_eq!(db.get_collection::<Note>().unwrap(), vec![note.clone()]);

        note.text = "edited".to_string();
        db.set(&note).unwrap();
        assert_eq!(db.get_collection::<Note>().unwrap(), vec![note]);
    }

    #[test]
    fn insert_if_absent_keeps_first_value() {
        let db = SledDb::temporary().unwrap();
        assert!(db.insert_if_absent("kv", "key", &"first".to_string()).unwrap());
        assert!(!db.insert_if_absent("kv", "key", &"second".to_string()).unwrap());
        let stored: Option<String> = db.get_raw_at("kv", "key").unwrap();
        assert_eq!(stored.as_deref(), Some("first"));
    }
}
