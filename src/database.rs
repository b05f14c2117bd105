use crate::model::*;
use std::convert::TryInto;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("malformed key of length {0}")]
    BadKey(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

// Big-endian so that key order in a tree is id order.
fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Result<u64> {
    let id = id.as_ref();
    let bytes: [u8; 8] = id.try_into().map_err(|_| Error::BadKey(id.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

fn decode_entry<T: serde::de::DeserializeOwned>(
    (key, value): (sled::IVec, sled::IVec),
) -> Result<(u64, T)> {
    Ok((deserialize_id(key)?, bincode::deserialize(&value)?))
}

pub trait UserDb {
    fn add_user(&self, user: &User) -> Result<u64>;
    /// The administrator: the user stored first.
    fn first_user(&self) -> Result<Option<(u64, User)>>;
    fn update_user(&self, id: u64, user: &User) -> Result<bool>;
}

pub trait MovieDb {
    fn add_movie(&self, movie: &Movie) -> Result<u64>;
    fn get_movie(&self, id: u64) -> Result<Option<Movie>>;
    fn list_movies(&self) -> Result<Vec<(u64, Movie)>>;
    fn update_movie(&self, id: u64, movie: &Movie) -> Result<bool>;
    fn remove_movie(&self, id: u64) -> Result<Option<Movie>>;
}

const USERS: &[u8] = b"users";
const MOVIES: &[u8] = b"movies";

fn insert<T: serde::Serialize>(db: &sled::Db, tree: &[u8], value: &T) -> Result<u64> {
    let tree = db.open_tree(tree)?;
    let id = db.generate_id()?;
    tree.insert(&serialize_id(id), bincode::serialize(value)?)?;
    Ok(id)
}

fn get<T: serde::de::DeserializeOwned>(db: &sled::Db, tree: &[u8], id: u64) -> Result<Option<T>> {
    let tree = db.open_tree(tree)?;
    match tree.get(serialize_id(id))? {
        Some(data) => Ok(Some(bincode::deserialize(&data)?)),
        None => Ok(None),
    }
}

/// Overwrites an existing record. Returns `false` if there was nothing to overwrite.
fn update<T: serde::Serialize>(db: &sled::Db, tree: &[u8], id: u64, value: &T) -> Result<bool> {
    let tree = db.open_tree(tree)?;
    let data = bincode::serialize(value)?;
    let key = serialize_id(id);
    loop {
        let current = match tree.get(&key)? {
            Some(current) => current,
            None => return Ok(false),
        };
        // Retry if the record changed between the read and the swap.
        if tree
            .compare_and_swap(&key, Some(current), Some(data.as_slice()))?
            .is_ok()
        {
            return Ok(true);
        }
    }
}

impl UserDb for sled::Db {
    fn add_user(&self, user: &User) -> Result<u64> {
        insert(self, USERS, user)
    }

    fn first_user(&self) -> Result<Option<(u64, User)>> {
        let users = self.open_tree(USERS)?;
        users.first()?.map(decode_entry).transpose()
    }

    fn update_user(&self, id: u64, user: &User) -> Result<bool> {
        update(self, USERS, id, user)
    }
}

impl MovieDb for sled::Db {
    fn add_movie(&self, movie: &Movie) -> Result<u64> {
        insert(self, MOVIES, movie)
    }

    fn get_movie(&self, id: u64) -> Result<Option<Movie>> {
        get(self, MOVIES, id)
    }

    fn list_movies(&self) -> Result<Vec<(u64, Movie)>> {
        let movies = self.open_tree(MOVIES)?;
        movies
            .iter()
            .map(|entry| decode_entry(entry?))
            .collect()
    }

    fn update_movie(&self, id: u64, movie: &Movie) -> Result<bool> {
        update(self, MOVIES, id, movie)
    }

    fn remove_movie(&self, id: u64) -> Result<Option<Movie>> {
        let movies = self.open_tree(MOVIES)?;
        match movies.remove(serialize_id(id))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }
}
