use std::sync::Arc;

use log::warn;

use crate::model::saved_account::SavedAccount;
use crate::storage::local_store::{KeyValueStore, keys};
use crate::storage::schema;

/// 已保存的账号列表，每次修改都整体写回本地存储
pub struct AccountBook {
    store: Arc<dyn KeyValueStore>,
    accounts: Vec<SavedAccount>,
}

fn load_accounts(store: &dyn KeyValueStore) -> Vec<SavedAccount> {
    match schema::read_entity(store, keys::SAVED_ACCOUNTS) {
        Ok(accounts) => accounts.unwrap_or_default(),
        Err(err) => {
            warn!("Failed to load accounts: {}", err);
            Vec::new()
        }
    }
}

impl AccountBook {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let accounts = load_accounts(&*store);
        AccountBook { store, accounts }
    }

    /// 丢弃内存中的列表，从本地存储重新读取
    pub fn reload(&mut self) {
        self.accounts = load_accounts(&*self.store);
    }

    pub fn accounts(&self) -> &[SavedAccount] {
        &self.accounts
    }

    pub fn get_account(&self, username: &str) -> Option<&SavedAccount> {
        self.accounts.iter().find(|account| account.username == username)
    }

    /// 按用户名新增或原位更新
    pub fn save_account(&mut self, username: &str, password: &str) -> &SavedAccount {
        let account = SavedAccount {
            username: username.to_string(),
            password: password.to_string(),
            saved_at: chrono::Utc::now().timestamp_millis(),
        };

        let index = match self.accounts.iter().position(|a| a.username == username) {
            Some(index) => {
                self.accounts[index] = account;
                index
            }
            None => {
                self.accounts.push(account);
                self.accounts.len() - 1
            }
        };
        self.persist();
        &self.accounts[index]
    }

    pub fn remove_account(&mut self, username: &str) -> bool {
        let Some(index) = self.accounts.iter().position(|a| a.username == username) else {
            return false;
        };
        self.accounts.remove(index);
        self.persist();
        true
    }

    fn persist(&self) {
        if let Err(err) = schema::write_entity(&*self.store, keys::SAVED_ACCOUNTS, &self.accounts) {
            warn!("Failed to save accounts: {}", err);
        }
    }
}
