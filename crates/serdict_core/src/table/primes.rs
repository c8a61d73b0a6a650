// Bucket counts the runtime picks from; beyond the table it searches odd numbers.
const PRIMES: [i32; 72] = [
    3, 7, 11, 17, 23, 29, 37, 47, 59, 71, 89, 107, 131, 163, 197, 239, 293, 353, 431, 521, 631,
    761, 919, 1103, 1327, 1597, 1931, 2333, 2801, 3371, 4049, 4861, 5839, 7013, 8419, 10103, 12143,
    14591, 17519, 21023, 25229, 30293, 36353, 43627, 52361, 62851, 75431, 90523, 108631, 130363,
    156437, 187751, 225307, 270371, 324449, 389357, 467237, 560689, 672827, 807403, 968897,
    1162687, 1395263, 1674319, 2009191, 2411033, 2893249, 3471899, 4166287, 4999559, 5999471,
    7199369,
];

const HASH_PRIME: i32 = 101;

/// Smallest bucket count the runtime would allocate for `min` entries.
pub fn capacity_for(min: usize) -> usize {
    let min = i32::try_from(min).unwrap_or(i32::MAX);
    if let Some(&p) = PRIMES.iter().find(|&&p| p >= min) {
        return p as usize;
    }

    let mut candidate = min | 1;
    while candidate < i32::MAX {
        if is_prime(candidate) && (candidate - 1) % HASH_PRIME != 0 {
            return candidate as usize;
        }
        candidate += 2;
    }
    min as usize
}

fn is_prime(candidate: i32) -> bool {
    if candidate & 1 == 0 {
        return candidate == 2;
    }
    let limit = f64::from(candidate).sqrt() as i32;
    let mut divisor = 3;
    while divisor <= limit {
        if candidate % divisor == 0 {
            return false;
        }
        divisor += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_counts_use_minimum_prime() {
        assert_eq!(capacity_for(0), 3);
        assert_eq!(capacity_for(1), 3);
        assert_eq!(capacity_for(3), 3);
        assert_eq!(capacity_for(4), 7);
        assert_eq!(capacity_for(12), 17);
    }

    #[test]
    fn past_table_searches_odd_primes() {
        let cap = capacity_for(7_199_370);
        assert!(cap > 7_199_369);
        assert!(is_prime(cap as i32));
        assert_ne!((cap - 1) % 101, 0);
    }

    #[test]
    fn prime_table_is_sorted_and_prime() {
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
        assert!(PRIMES.iter().all(|&p| is_prime(p)));
    }
}
