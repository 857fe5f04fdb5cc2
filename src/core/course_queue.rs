use std::collections::HashSet;
use std::sync::Arc;

use log::warn;

use crate::core::notify::Notifier;
use crate::model::queued_course::{NewCourse, QueuedCourse};
use crate::storage::local_store::{KeyValueStore, keys};
use crate::storage::schema;

/// 抢课列表。同一 (teachingClassId, electiveBatchCode) 最多出现一次
pub struct CourseQueue {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    queue: Vec<QueuedCourse>,
}

fn load_queue(store: &dyn KeyValueStore) -> Vec<QueuedCourse> {
    let queue: Vec<QueuedCourse> = match schema::read_entity(store, keys::COURSE_QUEUE) {
        Ok(queue) => queue.unwrap_or_default(),
        Err(err) => {
            warn!("Failed to load course queue: {}", err);
            return Vec::new();
        }
    };

    // 手工改过的存储文件可能带重复项，保留先出现的
    let mut seen = HashSet::new();
    let before = queue.len();
    let queue: Vec<QueuedCourse> = queue
        .into_iter()
        .filter(|course| {
            let (class_id, batch) = course.natural_key();
            seen.insert((class_id.to_string(), batch.to_string()))
        })
        .collect();
    if queue.len() != before {
        warn!("抢课列表中有 {} 个重复项已忽略", before - queue.len());
    }
    queue
}

impl CourseQueue {
    pub fn load(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let queue = load_queue(&*store);
        CourseQueue {
            store,
            notifier,
            queue,
        }
    }

    pub fn reload(&mut self) {
        self.queue = load_queue(&*self.store);
    }

    pub fn items(&self) -> &[QueuedCourse] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QueuedCourse> {
        self.queue.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, teaching_class_id: &str, elective_batch_code: &str) -> bool {
        self.queue
            .iter()
            .any(|item| item.natural_key() == (teaching_class_id, elective_batch_code))
    }

    /// 加入抢课列表；同一批次下的同一教学班已存在时不做修改并返回 `false`
    pub fn add(&mut self, course: NewCourse) -> bool {
        let (class_id, batch) = course.natural_key();
        if self.contains(class_id, batch) {
            self.notifier.warning("该课程已在抢课列表中");
            return false;
        }

        let added_at = chrono::Utc::now().timestamp_millis();
        let mut stamp = added_at;
        let mut id = format!("{}_{}", course.teaching_class_id, stamp);
        while self.queue.iter().any(|item| item.id == id) {
            stamp += 1;
            id = format!("{}_{}", course.teaching_class_id, stamp);
        }

        self.queue.push(QueuedCourse {
            id,
            course,
            added_at,
        });
        self.persist();
        self.notifier.success("已添加到抢课列表");
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.queue.iter().position(|item| item.id == id) else {
            return false;
        };
        self.queue.remove(index);
        self.persist();
        self.notifier.success("已从抢课列表移除");
        true
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.persist();
        self.notifier.success("抢课列表已清空");
    }

    fn persist(&self) {
        if let Err(err) = schema::write_entity(&*self.store, keys::COURSE_QUEUE, &self.queue) {
            warn!("Failed to save course queue: {}", err);
        }
    }
}
