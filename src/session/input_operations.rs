//! Session Input Operations
//!
//! The XR layer may push from any thread through a cloned sender; the
//! session drains everything once per tick.

use crossbeam_channel::{bounded, Sender, TrySendError};

use super::input_data::{InputEvent, InputMetrics, InputQueueData};

/// Create a bounded input queue
pub fn create_input_queue(max_queue_size: usize) -> InputQueueData {
    let (sender, receiver) = bounded(max_queue_size.max(1));
    InputQueueData {
        sender,
        receiver,
        max_queue_size: max_queue_size.max(1),
        metrics: InputMetrics::default(),
    }
}

/// Sender handle for producers on other threads
pub fn input_sender(queue: &InputQueueData) -> Sender<InputEvent> {
    queue.sender.clone()
}

/// Queue a single input. Returns false when the queue is full and the input was dropped.
pub fn queue_input(queue: &mut InputQueueData, event: InputEvent) -> bool {
    match queue.sender.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            queue.metrics.events_dropped += 1;
            log::warn!("[InputQueue] Queue full, dropping input: {:?}", event);
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            queue.metrics.events_dropped += 1;
            false
        }
    }
}

/// Take every queued input in arrival order
pub fn drain_inputs(queue: &mut InputQueueData) -> Vec<InputEvent> {
    let pending = queue.receiver.len();
    if pending > queue.metrics.peak_queue_size {
        queue.metrics.peak_queue_size = pending;
    }
    queue.receiver.try_iter().collect()
}

/// Number of inputs waiting
pub fn pending_inputs(queue: &InputQueueData) -> usize {
    queue.receiver.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropId;
    use std::thread;

    #[test]
    fn test_inputs_drain_in_order() {
        let mut queue = create_input_queue(8);
        queue_input(&mut queue, InputEvent::GrabStart { prop: PropId(0), actor_pose: None });
        queue_input(&mut queue, InputEvent::GrabEnd { prop: PropId(0) });

        let drained = drain_inputs(&mut queue);
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], InputEvent::GrabStart { .. }));
        assert!(matches!(drained[1], InputEvent::GrabEnd { .. }));
        assert_eq!(pending_inputs(&queue), 0);
        assert_eq!(queue.metrics.peak_queue_size, 2);
    }

    #[test]
    fn test_full_queue_drops_new_input() {
        let mut queue = create_input_queue(1);
        assert!(queue_input(&mut queue, InputEvent::KnobGrabEnd));
        assert!(!queue_input(&mut queue, InputEvent::ResetScene));
        assert_eq!(queue.metrics.events_dropped, 1);

        let drained = drain_inputs(&mut queue);
        assert!(matches!(drained[..], [InputEvent::KnobGrabEnd]));
    }

    #[test]
    fn test_sender_works_from_another_thread() {
        let mut queue = create_input_queue(16);
        let sender = input_sender(&queue);
        let producer = thread::spawn(move || {
            for degrees in [10.0, 20.0, 30.0] {
                sender.send(InputEvent::KnobRotation { degrees }).expect("send");
            }
        });
        producer.join().expect("producer thread");

        assert_eq!(drain_inputs(&mut queue).len(), 3);
    }
}
